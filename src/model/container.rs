use serde::Serialize;

/// How a container buffer was framed when it was loaded.
///
/// Kept with the parsed data so a save reproduces the same framing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    /// Leading signature word, preserved verbatim.
    pub signature: u32,
    /// Self-describing header, when the buffer had one.
    pub wrapper: Option<WrapperInfo>,
    /// The buffer was whole-buffer compressed.
    pub compressed: bool,
}

/// Wrapper header fields that are not derived from the content version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WrapperInfo {
    pub format_version: u8,
    /// Feature byte as found on disk; may disagree with the derived one.
    pub stored_features: u8,
    pub reserved: [u8; 7],
}

impl Default for WrapperInfo {
    fn default() -> Self {
        Self {
            format_version: 1,
            stored_features: 0,
            reserved: [0; 7],
        }
    }
}
