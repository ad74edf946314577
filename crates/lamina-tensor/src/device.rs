/// Memory space where a tensor's elements reside.
///
/// Every operation in this workspace requires its operands to live in the same memory space.
/// The space is encoded in the type system through [`crate::DeviceMarker`]; this enum is the
/// runtime tag returned by [`crate::Tensor::device`] and shown in `Debug` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Device {
    /// Host memory.
    #[default]
    Cpu,
}
