// src/utils/report.rs

use crate::model::dial::DialKind;
use crate::model::mode::ExperimentMode;
use crate::physics::reciprocal::MillerReadout;
use crate::physics::spectrum::SpectrumShape;
use crate::state::SessionState;

const NA: &str = "N/A";

fn dial_text(state: &SessionState, kind: DialKind) -> String {
    state.dials.label(kind).unwrap_or_else(|| NA.to_string())
}

/// Generates the multi-line status label shown next to the image
pub fn session_summary(state: &SessionState) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Mode: {}   Current dial: {}\n",
        state.experiment_mode(),
        state.current_dial
    ));
    out.push_str(&format!(
        "Domain size: {}   Mosaic: {}\n",
        dial_text(state, DialKind::DomainSize),
        dial_text(state, DialKind::MosAngDeg)
    ));
    out.push_str(&format!("a,b,c = {}\n", state.cell.label()));

    if state.diffuse_scattering {
        out.push_str(&format!(
            "Diffuse gamma: {}   sigma: {}   aniso: {}\n",
            dial_text(state, DialKind::DiffGamma),
            dial_text(state, DialKind::DiffSigma),
            dial_text(state, DialKind::Aniso)
        ));
    } else {
        out.push_str("Diffuse gamma: N/A   sigma: N/A   aniso: N/A\n");
    }

    // Energy is meaningless for SASE, bandwidth for anything but Gaussian
    let shape = state.spectrum.shape();
    let energy = match shape {
        SpectrumShape::Sase => NA.to_string(),
        _ => dial_text(state, DialKind::Energy),
    };
    let bandwidth = match shape {
        SpectrumShape::Gaussian => state
            .dials
            .stored_value(DialKind::Bandwidth)
            .and_then(|v| DialKind::Bandwidth.format_value(v))
            .unwrap_or_else(|| NA.to_string()),
        _ => NA.to_string(),
    };
    out.push_str(&format!("Spectrum: {}   Energy/Bandwidth = {} / {}\n", shape, energy, bandwidth));

    match state.experiment_mode() {
        ExperimentMode::Stills => out.push_str(&format!(
            "RotX/RotY/RotZ = {} / {} / {}\n",
            dial_text(state, DialKind::RotX),
            dial_text(state, DialKind::RotY),
            dial_text(state, DialKind::RotZ)
        )),
        ExperimentMode::Rotation => out.push_str(&format!(
            "Sweep: Delta_phi {}   image {}   spindle {}\n",
            dial_text(state, DialKind::DeltaPhi),
            dial_text(state, DialKind::Image),
            dial_text(state, DialKind::RotZ)
        )),
    }

    out.push_str(&format!(
        "{}   Brightness: {}\n",
        dial_text(state, DialKind::Fhkl),
        dial_text(state, DialKind::Brightness)
    ));
    out
}

/// Comma-separated active dial names, in cursor order.
pub fn dial_list(state: &SessionState) -> String {
    state
        .dials
        .active_dials()
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One-line text for the Miller index under the pointer
pub fn pixel_readout(fast: f64, slow: f64, readout: &MillerReadout) -> String {
    let (h, k, l) = readout.hkl;
    format!(
        "Pixel ({:.1}, {:.1})   hkl = ({}, {}, {})   [{:.2}, {:.2}, {:.2}]   dist = {:.3}   |F| = {:.2}",
        fast,
        slow,
        h,
        k,
        l,
        readout.hkl_frac[0],
        readout.hkl_frac[1],
        readout.hkl_frac[2],
        readout.distance,
        readout.amplitude
    )
}
