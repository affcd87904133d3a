use anyhow::{bail, Result};

/// Mean equatorial radii in km.
pub(crate) const PLANET_RADII: [(&str, f64); 8] = [
    ("jupiter", 69911.0),
    ("uranus", 25362.0),
    ("mercury", 2439.7),
    ("mars", 3389.5),
    ("neptune", 24764.0),
    ("earth", 6371.0),
    ("saturn", 58232.0),
    ("venus", 6051.8),
];

/// Bodies whose ephemeris entry is the system barycenter rather than the planet.
const BARYCENTER_BODIES: [&str; 6] = ["mercury", "jupiter", "pluto", "uranus", "saturn", "neptune"];

/// Which set of names a command accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Sun and moon, for rise/set events.
    Luminaries,
    /// Planets with a known radius.
    Planets,
}

pub(crate) fn radius_km(name: &str) -> Option<f64> {
    PLANET_RADII.iter().find(|(n, _)| *n == name).map(|&(_, r)| r)
}

pub(crate) fn is_supported(name: &str, scope: Scope) -> bool {
    match scope {
        Scope::Luminaries => name == "sun" || name == "moon",
        Scope::Planets => radius_km(name).is_some(),
    }
}

/// Fails on the first unsupported name so the command aborts before any output.
pub(crate) fn check_supported<S: AsRef<str>>(names: &[S], scope: Scope) -> Result<()> {
    for name in names {
        let name = name.as_ref();
        if !is_supported(name, scope) {
            bail!("planet {name} is not supported by this command");
        }
    }
    Ok(())
}

pub(crate) fn barycenter_key(name: &str) -> Option<String> {
    BARYCENTER_BODIES
        .contains(&name)
        .then(|| format!("{name} barycenter"))
}

/// Splits a comma separated list like `"sun, Moon"` into lowercase names.
pub(crate) fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
