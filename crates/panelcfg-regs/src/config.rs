/// Controls how a [`RegisterMap`](crate::RegisterMap) treats device data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, snapshots carrying addresses without a descriptor are
    /// rejected with `RegsError::UnknownRegister`.
    pub strict_mode: bool,
    /// Maximum bytes read from a descriptor file.
    pub max_descriptor_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            max_descriptor_file_size: 256 * 1024,
        }
    }
}
