// src/controller.rs
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use crate::config::Config;
use crate::error::{Result, SimViewError};
use crate::model::amplitudes::AmplitudeTable;
use crate::model::dial::{DialKind, DialRegistry, Step};
use crate::model::mode::{ExperimentMode, ModeSwitch};
use crate::model::symmetry::SymmetryOracle;
use crate::model::unit_cell::UnitCellCoupler;
use crate::physics::detector::{DetectorGeometry, PixelAddress};
use crate::physics::gateway::{CrystalModel, OrientationRandomizer, SimRequest, SimulationGateway};
use crate::physics::reciprocal::{MillerReadout, OrientationQuery, ReciprocalResolver};
use crate::physics::spectrum::{
    energy_to_wavelength, SaseGenerator, SpectrumModel, SpectrumShape, SpectrumSource, SpectrumTrigger,
};
use crate::rendering::compositor::{Compositor, Displayable};
use crate::rendering::image::ImageSet;
use crate::state::SessionState;
use crate::utils::report;

/// One user action. Each runs to completion and calls the gateway at most once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    NextDial,
    PrevDial,
    SelectDial(DialKind),
    Step(Step),
    SetValue(DialKind, f64),
    NewPulse,
    ResetAll,
    ToggleImageMode,
    ToggleSpectrumShape,
    /// Steps the shape cycle backwards (monochromatic → SASE → Gaussian).
    ToggleSpectrumShapeBack,
    ToggleDiffuse,
    ToggleStructureFactors,
    RandomizeOrientation,
    UpdateReference,
    SetMode(ExperimentMode),
}

/// What the session is built from.
pub struct SessionSetup {
    pub geometry: DetectorGeometry,
    pub panels: usize,
    /// Pixel order of every gateway result.
    pub pixels: Vec<PixelAddress>,
    pub crystal: CrystalModel,
    pub amplitudes: AmplitudeTable,
    /// Overrides the built-in SASE generator.
    pub pulse_source: Option<Box<dyn SpectrumSource>>,
    /// Seeds the orientation-randomization seed draws.
    pub seed: u64,
}

/// Owns the session state and its collaborators and applies actions to them.
pub struct SimController<G, R> {
    state: SessionState,
    gateway: G,
    randomizer: R,
    resolver: ReciprocalResolver,
    pixels: Vec<PixelAddress>,
    seeds: StdRng,
}

impl<G: SimulationGateway, R: OrientationRandomizer> SimController<G, R> {
    /// Builds the dial set for the loaded crystal and simulates the first
    /// reference/simulated pair.
    pub fn new(
        config: &Config,
        setup: SessionSetup,
        oracle: &dyn SymmetryOracle,
        gateway: G,
        randomizer: R,
    ) -> Result<Self> {
        config.validate()?;
        let SessionSetup { geometry, panels, pixels, crystal, amplitudes, pulse_source, seed } = setup;

        // 1. Dials, with a/b/c pruned by symmetry
        let cell = UnitCellCoupler::detect(crystal.unit_cell, oracle);
        let mut specs = config.dial_specs();
        specs.extend(cell.dial_specs(&config.ucell_scale));
        let mut dials = DialRegistry::new(specs);
        cell.prune_dials(&mut dials);
        let mode = ModeSwitch::new(config.experiment_mode, &mut dials);

        // 2. Spectrum
        let energy = dials.require(DialKind::Energy)?;
        let source = match pulse_source {
            Some(source) => source,
            None => Box::new(SaseGenerator::new(energy, config.sase_seed).with_limit(config.sase_pulse_limit)),
        };
        let mut spectrum = SpectrumModel::new(config.spectrum()?, source);
        if mode.mode() == ExperimentMode::Rotation {
            spectrum.lock_monochromatic();
        }
        let bandwidth = dials.stored_value(DialKind::Bandwidth).unwrap_or(0.0);
        spectrum.update(SpectrumTrigger::Init, energy, bandwidth)?;

        // 3. Images
        let brightness = dials.require(DialKind::Brightness)?;
        let current_dial = dials
            .active_dials()
            .first()
            .copied()
            .ok_or_else(|| SimViewError::Config("no active dials".to_string()))?;

        let state = SessionState {
            images: ImageSet::new(panels, geometry.slow_size, geometry.fast_size),
            compositor: Compositor::new(config.image_mode, brightness),
            displayable: Displayable::Gray { width: 0, height: 0, pixels: Vec::new() },
            start_orientation: crystal.u,
            crystal,
            dials,
            cell,
            mode,
            spectrum,
            diffuse_scattering: false,
            current_dial,
        };

        let mut controller = Self {
            state,
            gateway,
            randomizer,
            resolver: ReciprocalResolver::new(geometry, amplitudes),
            pixels,
            seeds: StdRng::seed_from_u64(seed),
        };
        controller.generate(true)?;
        log::info!("Session ready: {}", report::dial_list(&controller.state));
        Ok(controller)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn displayable(&self) -> &Displayable {
        &self.state.displayable
    }

    pub fn current_dial(&self) -> DialKind {
        self.state.current_dial
    }

    pub fn summary(&self) -> String {
        report::session_summary(&self.state)
    }

    pub fn handle(&mut self, action: Action) -> Result<()> {
        match action {
            Action::NextDial => {
                self.state.next_dial();
            }
            Action::PrevDial => {
                self.state.prev_dial();
            }
            Action::SelectDial(kind) => {
                self.state.select_dial(kind);
            }
            Action::Step(step) => {
                self.step(step)?;
            }
            Action::SetValue(kind, value) => {
                self.set_value(kind, value)?;
            }
            Action::NewPulse => self.new_pulse()?,
            Action::ResetAll => self.reset_all()?,
            Action::ToggleImageMode => {
                let mode = self.state.compositor.cycle_mode();
                log::debug!("Image mode: {:?}", mode);
                self.recomposite();
            }
            Action::ToggleSpectrumShape => self.toggle_spectrum_shape(true)?,
            Action::ToggleSpectrumShapeBack => self.toggle_spectrum_shape(false)?,
            Action::ToggleDiffuse => {
                self.state.diffuse_scattering = !self.state.diffuse_scattering;
                log::info!("Diffuse scattering {}", if self.state.diffuse_scattering { "on" } else { "off" });
                self.generate(false)?;
            }
            Action::ToggleStructureFactors => {
                let fhkl = self.state.dials.require(DialKind::Fhkl)?;
                self.set_value(DialKind::Fhkl, if fhkl != 0.0 { 0.0 } else { 1.0 })?;
            }
            Action::RandomizeOrientation => self.randomize_orientation()?,
            Action::UpdateReference => {
                log::info!("Updating reference image");
                self.generate(true)?;
            }
            Action::SetMode(target) => self.set_mode(target)?,
        }
        Ok(())
    }

    /// Steps the current dial. Returns `Ok(false)` when the step would leave
    /// the dial's range (nothing happens).
    pub fn step(&mut self, step: Step) -> Result<bool> {
        let kind = self.state.current_dial;
        match self.state.dials.step(kind, step)? {
            Some(value) => {
                self.apply_dial_change(kind, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sets a dial directly. Returns `Ok(false)` for out-of-range values.
    pub fn set_value(&mut self, kind: DialKind, value: f64) -> Result<bool> {
        if !self.state.dials.set_value(kind, value)? {
            return Ok(false);
        }
        self.apply_dial_change(kind, value)?;
        Ok(true)
    }

    /// Propagates a committed dial value: derived state first, then the image.
    fn apply_dial_change(&mut self, kind: DialKind, value: f64) -> Result<()> {
        log::debug!("{} = {}", kind, value);
        match kind {
            DialKind::Energy | DialKind::Bandwidth => {
                let (energy, bandwidth) = (self.state.energy()?, self.state.bandwidth());
                self.state.spectrum.update(SpectrumTrigger::ParameterChange, energy, bandwidth)?;
            }
            DialKind::CellA | DialKind::CellB | DialKind::CellC => {
                self.state.cell.apply(kind, value, &mut self.state.dials);
            }
            DialKind::Brightness => {
                self.state.compositor.set_brightness(value, &self.state.images.reference);
                self.recomposite();
                return Ok(());
            }
            _ => {}
        }
        self.generate(false)
    }

    fn new_pulse(&mut self) -> Result<()> {
        if self.state.spectrum.shape() != SpectrumShape::Sase {
            log::debug!("New pulse ignored for {} spectrum", self.state.spectrum.shape());
            return Ok(());
        }
        let (energy, bandwidth) = (self.state.energy()?, self.state.bandwidth());
        self.state.spectrum.update(SpectrumTrigger::NewPulse, energy, bandwidth)?;
        self.generate(false)
    }

    fn toggle_spectrum_shape(&mut self, forward: bool) -> Result<()> {
        if self.state.spectrum.cycle_shape(forward).is_none() {
            return Ok(());
        }
        let (energy, bandwidth) = (self.state.energy()?, self.state.bandwidth());
        self.state.spectrum.update(SpectrumTrigger::NewPulse, energy, bandwidth)?;
        self.generate(false)
    }

    /// Every dial back to its default, starting orientation restored.
    pub fn reset_all(&mut self) -> Result<()> {
        log::info!("Resetting all dials");
        self.state.dials.reset_all();
        self.state.cell.reset();
        self.state.crystal.u = self.state.start_orientation;

        let (energy, bandwidth) = (self.state.energy()?, self.state.bandwidth());
        self.state.spectrum.update(SpectrumTrigger::ParameterChange, energy, bandwidth)?;
        let brightness = self.state.dials.require(DialKind::Brightness)?;
        self.state.compositor.set_brightness(brightness, &self.state.images.reference);
        self.generate(true)
    }

    fn randomize_orientation(&mut self) -> Result<()> {
        let seed_a = self.seeds.gen_range(0..=1024);
        let seed_b = self.seeds.gen_range(0..=1024);
        log::info!("Randomizing orientation (seeds {}, {})", seed_a, seed_b);
        self.randomizer.randomize(&mut self.state.crystal, seed_a, seed_b);
        self.generate(true)
    }

    fn set_mode(&mut self, target: ExperimentMode) -> Result<()> {
        if !self.state.mode.transition(target, &mut self.state.dials) {
            return Ok(());
        }
        match target {
            ExperimentMode::Rotation => self.state.spectrum.lock_monochromatic(),
            ExperimentMode::Stills => self.state.spectrum.unlock(),
        }
        let (energy, bandwidth) = (self.state.energy()?, self.state.bandwidth());
        self.state.spectrum.update(SpectrumTrigger::ModeChange, energy, bandwidth)?;
        self.state.ensure_cursor();
        self.generate(true)
    }

    /// Resolves the Miller index under a detector pixel. No side effects.
    pub fn query_pixel(&self, fast: f64, slow: f64) -> Result<MillerReadout> {
        let query = OrientationQuery {
            missetting_deg: self.state.missetting_deg(),
            u: self.state.crystal.u,
            b: self
                .state
                .cell
                .scaled()
                .reciprocal_matrix()
                .ok_or(SimViewError::SingularOrientation)?,
            wavelength: energy_to_wavelength(self.state.energy()?),
            structure_factors: self.state.structure_factors(),
        };
        self.resolver.resolve(fast, slow, &query)
    }

    /// Status-bar text for the pixel under the pointer.
    pub fn pixel_readout(&self, fast: f64, slow: f64) -> Result<String> {
        let readout = self.query_pixel(fast, slow)?;
        Ok(report::pixel_readout(fast, slow, &readout))
    }

    /// One gateway call; buffers are only touched once it has succeeded.
    fn generate(&mut self, update_ref: bool) -> Result<()> {
        let state = &self.state;
        let request = SimRequest {
            geometry: self.resolver.geometry(),
            pixels: &self.pixels,
            crystal: &state.crystal,
            unit_cell: *state.cell.scaled(),
            domain_size: [state.dials.require(DialKind::DomainSize)?; 3],
            exposure: state.exposure()?,
            spectrum: state.spectrum.samples(),
            mosaic_angle_deg: state.dials.require(DialKind::MosAngDeg)?,
            diffuse: state.diffuse()?,
            structure_factors: state.structure_factors(),
        };

        let started = Instant::now();
        let pix = self.gateway.simulate(&request).map_err(|e| {
            log::error!("Simulation failed: {}", e);
            e
        })?;
        log::debug!("Simulated {} pixels in {:.2?}", pix.len(), started.elapsed());

        self.state.images.store(&self.pixels, &pix, update_ref)?;
        if update_ref {
            self.state.compositor.refresh_reference(&self.state.images.reference);
        }
        self.recomposite();
        Ok(())
    }

    fn recomposite(&mut self) {
        self.state.displayable = self.state.compositor.composite(&self.state.images);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::unit_cell::UnitCell;
    use crate::physics::detector::full_image_addresses;
    use crate::physics::gateway::Exposure;
    use crate::physics::spectrum::Pulse;
    use crate::utils::linalg;

    /// Cheap deterministic stand-in for the diffraction simulator.
    #[derive(Default)]
    struct ToyGateway {
        calls: usize,
        fail: bool,
        last_exposure: Option<Exposure>,
        last_spectrum: Vec<f64>,
    }

    impl SimulationGateway for ToyGateway {
        fn simulate(&mut self, request: &SimRequest<'_>) -> Result<Vec<f64>> {
            if self.fail {
                return Err(SimViewError::Gateway("toy gateway down".to_string()));
            }
            self.calls += 1;
            self.last_exposure = Some(request.exposure);
            self.last_spectrum = request.spectrum.iter().map(|s| s.flux).collect();

            let phase = match request.exposure {
                Exposure::Still { missetting } => missetting.iter().sum::<f64>(),
                Exposure::Sweep { phi_start, phi_range, spindle } => (phi_start + phi_range + spindle).to_radians(),
            };
            let flux: f64 = request.spectrum.iter().map(|s| s.flux).sum::<f64>() / 1e12;
            let lambda: f64 = request.spectrum.iter().map(|s| s.wavelength).sum::<f64>();
            let weight = if request.structure_factors { 2.0 } else { 1.0 };

            Ok((0..request.pixels.len())
                .map(|i| {
                    let x = (i as f64 + 1.0) * request.unit_cell.a * 0.01 * lambda + phase;
                    let mut v = weight * flux * request.domain_size[0] * x.sin().powi(2)
                        + request.mosaic_angle_deg
                        + request.crystal.u[(0, 1)];
                    if let Some(d) = request.diffuse {
                        v += d.gamma[0] * d.sigma[1] * (i % 5) as f64;
                    }
                    v
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct SpinRandomizer {
        calls: usize,
    }

    impl OrientationRandomizer for SpinRandomizer {
        fn randomize(&mut self, crystal: &mut CrystalModel, seed_a: u32, seed_b: u32) {
            self.calls += 1;
            crystal.u = linalg::rotation_z(seed_a as f64 + 1.0) * linalg::rotation_x(seed_b as f64 + 1.0);
        }
    }

    /// Pulses whose single flux value counts up.
    struct CountingSource(f64);

    impl SpectrumSource for CountingSource {
        fn next_pulse(&mut self) -> Result<Pulse> {
            self.0 += 1.0;
            Ok(Pulse {
                samples: vec![crate::physics::spectrum::SpectrumSample { wavelength: 1.3, flux: self.0 * 1e11 }],
                avg_wavelength: 1.3,
            })
        }
    }

    fn tetragonal(cell: &UnitCell) -> bool {
        (cell.a - cell.b).abs() < 1e-6
    }

    fn setup() -> SessionSetup {
        let geometry = DetectorGeometry {
            fast_size: 16,
            slow_size: 12,
            pixel_size: 0.1,
            origin: [0.0, 0.0, -100.0],
            fast_axis: [1.0, 0.0, 0.0],
            slow_axis: [0.0, -1.0, 0.0],
            s0: [0.0, 0.0, -1.0],
        };
        SessionSetup {
            pixels: full_image_addresses(1, geometry.slow_size, geometry.fast_size),
            geometry,
            panels: 1,
            crystal: CrystalModel::new(UnitCell::new(79.1, 79.1, 37.9, 90.0, 90.0, 90.0)),
            amplitudes: AmplitudeTable::from_amplitudes([((1, 0, 0), 5.0), ((0, 0, 1), 9.0), ((1, 1, 0), 20.0)]),
            pulse_source: Some(Box::new(CountingSource(0.0))),
            seed: 17,
        }
    }

    fn controller_with(config: Config) -> SimController<ToyGateway, SpinRandomizer> {
        SimController::new(&config, setup(), &tetragonal, ToyGateway::default(), SpinRandomizer::default()).unwrap()
    }

    fn controller() -> SimController<ToyGateway, SpinRandomizer> {
        controller_with(Config::default())
    }

    #[test]
    fn test_init_builds_reference() {
        let c = controller();
        assert_eq!(c.gateway().calls, 1);
        assert_eq!(c.state().images.reference, c.state().images.simulated);
        assert_eq!(c.current_dial(), DialKind::DomainSize);
        assert!(!c.state().dials.is_active(DialKind::CellB));
        assert!(c.state().dials.is_active(DialKind::CellC));
        assert_eq!(c.displayable().dimensions(), (16, 12));
    }

    #[test]
    fn test_dial_edit_leaves_reference() {
        let mut c = controller();
        let reference = c.state().images.reference.clone();
        c.handle(Action::Step(Step::BigUp)).unwrap();

        assert_eq!(c.gateway().calls, 2);
        assert_eq!(c.state().dials.value(DialKind::DomainSize), Some(40.0));
        assert_eq!(c.state().images.reference, reference);
        assert_ne!(c.state().images.simulated, reference);
    }

    #[test]
    fn test_out_of_range_step_is_silent() {
        let mut c = controller();
        c.handle(Action::SelectDial(DialKind::Fhkl)).unwrap();
        assert!(!c.step(Step::SmallUp).unwrap());
        assert_eq!(c.state().dials.value(DialKind::Fhkl), Some(1.0));
        assert_eq!(c.gateway().calls, 1);

        assert!(!c.set_value(DialKind::Energy, 50_000.0).unwrap());
        assert_eq!(c.gateway().calls, 1);
    }

    #[test]
    fn test_inactive_dial_is_error() {
        let mut c = controller();
        assert!(matches!(c.set_value(DialKind::CellB, 80.0), Err(SimViewError::InactiveDial(_))));
        assert!(matches!(c.set_value(DialKind::Image, 3.0), Err(SimViewError::InactiveDial(_))));
    }

    #[test]
    fn test_cell_edit_couples_b() {
        let mut c = controller();
        assert!(c.set_value(DialKind::CellA, 79.1 * 1.1).unwrap());
        let cell = *c.state().cell.scaled();
        assert!((cell.b - 79.1 * 1.1).abs() < 1e-9);
        assert!((cell.c - 37.9).abs() < 1e-12);
        assert!(c.summary().contains("a,b,c = 87.01, 87.01, 37.90"));
    }

    #[test]
    fn test_reset_all() {
        let mut c = controller();
        c.set_value(DialKind::CellA, 79.1 * 1.5).unwrap();
        c.set_value(DialKind::MosAngDeg, 1.0).unwrap();
        c.set_value(DialKind::RotY, 20.0).unwrap();
        c.handle(Action::RandomizeOrientation).unwrap();
        assert_ne!(c.state().crystal.u, c.state().start_orientation);

        c.handle(Action::ResetAll).unwrap();
        let s = c.state();
        for kind in s.dials.active_dials() {
            let spec = s.dials.spec(kind).unwrap();
            assert_eq!(s.dials.value(kind), Some(spec.default), "{}", kind);
        }
        assert_eq!(s.cell.scaled(), s.cell.nominal());
        assert_eq!(s.crystal.u, s.start_orientation);
        assert_eq!(s.images.reference, s.images.simulated);
    }

    #[test]
    fn test_diffuse_toggle_changes_only_simulated() {
        let mut c = controller();
        c.set_value(DialKind::DiffGamma, 50.0).unwrap();
        c.set_value(DialKind::DiffSigma, 0.3).unwrap();
        c.set_value(DialKind::Aniso, 1.0).unwrap();
        let reference = c.state().images.reference.clone();
        let before = c.state().images.simulated.clone();

        c.handle(Action::ToggleDiffuse).unwrap();
        assert!(c.state().diffuse_scattering);
        assert_ne!(c.state().images.simulated, before);
        assert_eq!(c.state().images.reference, reference);
        assert!(c.summary().contains("Diffuse gamma: 50"));
    }

    #[test]
    fn test_structure_factors_off_flattens_lookup() {
        let mut c = controller();
        let with_sf = c.query_pixel(3.0, 4.0).unwrap();
        assert_ne!(with_sf.amplitude, 9.0);

        c.handle(Action::ToggleStructureFactors).unwrap();
        assert!(!c.state().structure_factors());
        for (fast, slow) in [(0.0, 0.0), (3.0, 4.0), (15.0, 11.0), (7.5, 2.25)] {
            assert_eq!(c.query_pixel(fast, slow).unwrap().amplitude, 9.0);
        }
    }

    #[test]
    fn test_query_direct_beam() {
        let c = controller();
        let r = c.query_pixel(0.0, 0.0).unwrap();
        assert_eq!(r.hkl, (0, 0, 0));
        assert!(r.distance < 1e-12);
    }

    #[test]
    fn test_mode_round_trip() {
        let mut c = controller();
        c.set_value(DialKind::RotX, 1.5).unwrap();
        c.set_value(DialKind::Bandwidth, 1.01).unwrap();
        c.handle(Action::SelectDial(DialKind::RotY)).unwrap();
        let before: Vec<_> = c.state().dials.active_dials().iter().map(|k| (*k, c.state().dials.value(*k))).collect();

        c.handle(Action::SetMode(ExperimentMode::Rotation)).unwrap();
        assert_eq!(c.state().spectrum.shape(), SpectrumShape::Monochromatic);
        assert!(c.state().spectrum.is_locked());
        assert_eq!(c.current_dial(), DialKind::DomainSize);
        assert!(matches!(c.gateway().last_exposure, Some(Exposure::Sweep { .. })));

        c.set_value(DialKind::Image, 5.0).unwrap();
        match c.gateway().last_exposure {
            Some(Exposure::Sweep { phi_start, phi_range, .. }) => {
                assert!((phi_start - 2.0).abs() < 1e-12);
                assert!((phi_range - 0.5).abs() < 1e-12);
            }
            other => panic!("expected sweep, got {:?}", other),
        }
        c.handle(Action::ToggleSpectrumShape).unwrap();
        assert_eq!(c.state().spectrum.shape(), SpectrumShape::Monochromatic);

        c.handle(Action::SetMode(ExperimentMode::Stills)).unwrap();
        let after: Vec<_> = c.state().dials.active_dials().iter().map(|k| (*k, c.state().dials.value(*k))).collect();
        assert_eq!(before, after);
        assert_eq!(c.state().spectrum.shape(), SpectrumShape::Monochromatic);
        assert!(!c.state().spectrum.is_locked());

        c.handle(Action::ToggleSpectrumShape).unwrap();
        assert_eq!(c.state().spectrum.shape(), SpectrumShape::Gaussian);
        assert_eq!(c.state().spectrum.samples().len(), 101);
    }

    #[test]
    fn test_sase_pulses_on_request_only() {
        let config = Config { spectrum_shape: "SASE".to_string(), ..Config::default() };
        let mut c = controller_with(config);
        let first = c.gateway().last_spectrum.clone();
        assert_eq!(first, vec![1e11]);

        c.set_value(DialKind::Energy, 10_000.0).unwrap();
        assert_eq!(c.gateway().last_spectrum, first);

        c.handle(Action::NewPulse).unwrap();
        assert_eq!(c.gateway().last_spectrum, vec![2e11]);
        assert!(c.summary().contains("Energy/Bandwidth = N/A / N/A"));
    }

    #[test]
    fn test_exhausted_pulses_keep_sase_edits_silent() {
        let config = Config { spectrum_shape: "SASE".to_string(), ..Config::default() };
        let mut session = setup();
        session.pulse_source = Some(Box::new(SaseGenerator::new(9500.0, 3).with_limit(2)));
        let mut c =
            SimController::new(&config, session, &tetragonal, ToyGateway::default(), SpinRandomizer::default()).unwrap();

        c.handle(Action::NewPulse).unwrap();
        let held = c.state().spectrum.samples().to_vec();
        assert!(matches!(c.handle(Action::NewPulse), Err(SimViewError::PulsesExhausted(2))));
        assert_eq!(c.state().spectrum.samples(), held.as_slice());

        assert!(c.set_value(DialKind::Energy, 10_000.0).unwrap());
        c.handle(Action::SelectDial(DialKind::Bandwidth)).unwrap();
        assert!(c.step(Step::BigUp).unwrap());
        c.handle(Action::ResetAll).unwrap();
        assert_eq!(c.state().spectrum.samples(), held.as_slice());
        assert_eq!(c.gateway().last_spectrum, held.iter().map(|s| s.flux).collect::<Vec<_>>());
    }

    #[test]
    fn test_reverse_shape_toggle() {
        let mut c = controller();
        c.handle(Action::ToggleSpectrumShapeBack).unwrap();
        assert_eq!(c.state().spectrum.shape(), SpectrumShape::Monochromatic);
        assert_eq!(c.gateway().last_spectrum, vec![1e12]);

        c.handle(Action::ToggleSpectrumShapeBack).unwrap();
        assert_eq!(c.state().spectrum.shape(), SpectrumShape::Sase);
        assert_eq!(c.gateway().last_spectrum, vec![1e11]);

        c.handle(Action::ToggleSpectrumShape).unwrap();
        assert_eq!(c.state().spectrum.shape(), SpectrumShape::Monochromatic);
        assert_eq!(c.gateway().calls, 4);
    }

    #[test]
    fn test_pixel_readout_text() {
        let c = controller();
        let text = c.pixel_readout(0.0, 0.0).unwrap();
        assert!(text.starts_with("Pixel (0.0, 0.0)   hkl = (0, 0, 0)"));
        assert!(text.ends_with("|F| = 0.00"));
    }

    #[test]
    fn test_new_pulse_ignored_for_gaussian() {
        let mut c = controller();
        c.handle(Action::NewPulse).unwrap();
        assert_eq!(c.gateway().calls, 1);
    }

    #[test]
    fn test_gateway_failure_keeps_buffers() {
        let mut c = controller();
        let displayed = c.displayable().clone();
        let simulated = c.state().images.simulated.clone();

        c.gateway_mut().fail = true;
        assert!(matches!(c.handle(Action::UpdateReference), Err(SimViewError::Gateway(_))));
        assert!(matches!(c.step(Step::SmallUp), Err(SimViewError::Gateway(_))));
        assert_eq!(c.displayable(), &displayed);
        assert_eq!(c.state().images.simulated, simulated);
    }

    #[test]
    fn test_brightness_only_recomposites() {
        let mut c = controller();
        let displayed = c.displayable().clone();
        c.set_value(DialKind::Brightness, 1.5).unwrap();
        assert_eq!(c.gateway().calls, 1);
        assert!((c.state().compositor.percentile() - 90.0).abs() < 1e-9);
        assert_ne!(c.displayable(), &displayed);
    }

    #[test]
    fn test_randomize_updates_reference() {
        let mut c = controller();
        let reference = c.state().images.reference.clone();
        c.handle(Action::RandomizeOrientation).unwrap();
        assert_eq!(c.gateway().calls, 2);
        assert_ne!(c.state().images.reference, reference);
        assert_eq!(c.state().images.reference, c.state().images.simulated);
    }

    #[test]
    fn test_dial_cursor() {
        let mut c = controller();
        c.handle(Action::PrevDial).unwrap();
        assert_eq!(c.current_dial(), DialKind::DomainSize);

        c.handle(Action::NextDial).unwrap();
        assert_eq!(c.current_dial(), DialKind::MosAngDeg);
        c.handle(Action::NextDial).unwrap();
        assert_eq!(c.current_dial(), DialKind::CellA);
        c.handle(Action::NextDial).unwrap();
        assert_eq!(c.current_dial(), DialKind::CellC);

        c.handle(Action::SelectDial(DialKind::Brightness)).unwrap();
        c.handle(Action::NextDial).unwrap();
        assert_eq!(c.current_dial(), DialKind::Brightness);
    }

    #[test]
    fn test_image_mode_cycle_skips_gateway() {
        let mut c = controller();
        c.handle(Action::ToggleImageMode).unwrap();
        assert!(matches!(c.displayable(), Displayable::Rgb { .. }));
        c.handle(Action::ToggleImageMode).unwrap();
        assert!(matches!(c.displayable(), Displayable::Gray { .. }));
        assert_eq!(c.gateway().calls, 1);
    }
}
