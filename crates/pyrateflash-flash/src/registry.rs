//! Programmer registry
//!
//! Maps programmer strings from the command line onto opened transports.

use std::collections::HashMap;

use pyrateflash_core::transport::TransportInfo;

use crate::handle::ProgrammerHandle;

/// Parsed programmer parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammerParams {
    /// Programmer name as given (aliases are not resolved)
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl ProgrammerParams {
    /// Parameters as borrowed `(key, value)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse a programmer string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
///
/// # Example
/// ```
/// use pyrateflash_flash::parse_programmer_params;
///
/// let params = parse_programmer_params("buspirate:dev=/dev/ttyUSB0,speed=2MHz").unwrap();
/// assert_eq!(params.name, "buspirate");
/// assert_eq!(params.params.get("speed"), Some(&"2MHz".to_string()));
/// ```
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));
    if name.is_empty() {
        return Err("Empty programmer name".into());
    }

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// Open a programmer by name
///
/// # Arguments
/// * `programmer` - Programmer string (e.g., "dummy" or "buspirate:dev=/dev/ttyUSB0")
///
/// # Example
/// ```ignore
/// let mut handle = open_programmer("bp:dev=/dev/ttyUSB0,speed=4MHz")?;
/// let id = handle.flash().read_jedec_id()?;
/// ```
pub fn open_programmer(programmer: &str) -> Result<ProgrammerHandle, Box<dyn std::error::Error>> {
    let params = parse_programmer_params(programmer)?;

    match params.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&params),

        #[cfg(feature = "buspirate")]
        "buspirate" | "bp" => open_buspirate(&params),

        _ => Err(format!(
            "Unknown programmer: {} (available: {})",
            params.name,
            programmer_names_short()
        )
        .into()),
    }
}

// Programmer-specific open functions

#[cfg(feature = "dummy")]
fn open_dummy(params: &ProgrammerParams) -> Result<ProgrammerHandle, Box<dyn std::error::Error>> {
    if let Some(key) = params.params.keys().next() {
        return Err(format!("dummy takes no parameters (got '{}')", key).into());
    }

    log::info!("Using in-memory W25Q64FV emulator");
    Ok(ProgrammerHandle::Dummy(
        pyrateflash_dummy::DummyFlash::new_default(),
    ))
}

#[cfg(feature = "buspirate")]
fn open_buspirate(
    params: &ProgrammerParams,
) -> Result<ProgrammerHandle, Box<dyn std::error::Error>> {
    use pyrateflash_buspirate::BusPirateOptions;

    let options = BusPirateOptions::from_params(params.pairs())
        .map_err(|e| format!("Invalid buspirate parameters: {}", e))?;

    log::info!("Opening Bus Pirate on {}...", options.device);

    let bp = pyrateflash_buspirate::open_buspirate(&options).map_err(|e| {
        format!(
            "Failed to initialize Bus Pirate on {}: {}\nMake sure the device is connected and not in use.",
            options.device, e
        )
    })?;

    Ok(ProgrammerHandle::BusPirate(bp))
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<TransportInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(TransportInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory W25Q64FV emulator for testing",
    });

    #[cfg(feature = "buspirate")]
    programmers.push(TransportInfo {
        name: "buspirate",
        aliases: &["bp"],
        description: "Bus Pirate binary SPI mode (dev=<port>[:baud],speed=<rate>,mode=<wtr|bulk>,pullups=<on|off>)",
    });

    programmers
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    if programmers.is_empty() {
        return "none (recompile with features)".to_string();
    }
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}
