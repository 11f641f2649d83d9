//! Volatile access to the real register block.

use std::fs::OpenOptions;
use std::path::Path;
use std::ptr::NonNull;

use memmap2::{MmapMut, MmapOptions};

use super::{Register, RegisterError, RegisterInterface, REGISTER_WINDOW_LEN};

/// Mapping granularity for memory device files.
const PAGE_SIZE: u64 = 4096;

/// The register block, accessed with volatile 32-bit loads and stores.
///
/// Either wraps a pointer the caller already owns, or keeps a mapping of a memory
/// device file (`/dev/mem`, a UIO node) alive for as long as the registers are used.
pub struct MmioRegisters {
    base: NonNull<u8>,
    _mapping: Option<MmapMut>,
}

impl std::fmt::Debug for MmioRegisters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmioRegisters")
            .field("base", &self.base)
            .field("mapped", &self._mapping.is_some())
            .finish()
    }
}

impl MmioRegisters {
    /// Uses the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to the register block, be 4-byte aligned, stay valid for
    /// the lifetime of the returned value, and nothing else may access the block
    /// while it exists.
    pub unsafe fn from_ptr(base: NonNull<u8>) -> Self {
        Self {
            base,
            _mapping: None,
        }
    }

    /// Maps the register block at physical address `base` through `device`.
    ///
    /// `device` is usually `/dev/mem`, which needs root privileges.
    pub fn map(device: &Path, base: u64) -> Result<Self, RegisterError> {
        let map_failed = |reason: String| RegisterError::MapFailed { base, reason };

        if base % 4 != 0 {
            return Err(map_failed("base address is not word aligned".to_string()));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device)
            .map_err(|e| map_failed(format!("{}: {e}", device.display())))?;

        let page = base & !(PAGE_SIZE - 1);
        let delta = (base - page) as usize;

        // SAFETY: the mapping covers device memory that this process treats as the
        // register block only. It is kept alive by the returned value.
        let mut mapping = unsafe {
            MmapOptions::new()
                .offset(page)
                .len(delta + REGISTER_WINDOW_LEN)
                .map_mut(&file)
        }
        .map_err(|e| map_failed(e.to_string()))?;

        // SAFETY: `delta + REGISTER_WINDOW_LEN` is within the mapping.
        let base_ptr = unsafe { mapping.as_mut_ptr().add(delta) };
        let base_ptr = NonNull::new(base_ptr).ok_or_else(|| map_failed("null mapping".into()))?;

        tracing::info!(
            "Mapped register block at {:#010x} through {}",
            base,
            device.display()
        );

        Ok(Self {
            base: base_ptr,
            _mapping: Some(mapping),
        })
    }

    fn field(&self, register: Register) -> *mut u32 {
        // SAFETY: every offset is inside the register window.
        unsafe { self.base.as_ptr().add(register.offset()) as *mut u32 }
    }
}

impl RegisterInterface for MmioRegisters {
    fn write_register(&mut self, register: Register, value: u32) -> Result<(), RegisterError> {
        if !register.is_writable() {
            return Err(RegisterError::ReadOnly(register));
        }
        tracing::trace!("{register} <- {value:#010x}");

        // SAFETY: the field is inside the window and aligned, see `from_ptr` and `map`.
        unsafe { core::ptr::write_volatile(self.field(register), value) };
        Ok(())
    }

    fn read_register(&mut self, register: Register) -> Result<u32, RegisterError> {
        if !register.is_readable() {
            return Err(RegisterError::WriteOnly(register));
        }

        // SAFETY: the field is inside the window and aligned, see `from_ptr` and `map`.
        let value = unsafe { core::ptr::read_volatile(self.field(register)) };
        tracing::trace!("{register} -> {value:#010x}");
        Ok(value)
    }
}
