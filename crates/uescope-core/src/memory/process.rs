//! Target process attachment.
//!
//! Enumerates processes by executable name, opens a read-only handle, and
//! records the main module's base address and size. The handle is the only
//! capability through which foreign memory is read; it closes on drop, and
//! once the target exits every read fails cleanly instead of crashing.

use crate::error::{Error, Result};
use crate::memory::reader::ReadMemory;

/// Identity of a candidate target process.
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

/// Read-only handle to a running target process.
pub struct ProcessHandle {
    #[cfg(target_os = "windows")]
    handle: windows::Win32::Foundation::HANDLE,
    pid: u32,
    name: String,
    base: u64,
    module_size: usize,
}

// SAFETY: the raw OS handle is a plain kernel object reference; reads
// through it are synchronous syscalls with no shared mutable state.
unsafe impl Send for ProcessHandle {}
unsafe impl Sync for ProcessHandle {}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(target_os = "windows")]
mod imp {
    use super::*;

    use tracing::{debug, info};
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW, PROCESSENTRY32W,
        Process32FirstW, Process32NextW, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32,
        TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::Threading::{
        OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
    };

    fn wide_to_string(wide: &[u16]) -> String {
        let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
        String::from_utf16_lossy(&wide[..len])
    }

    fn name_matches(candidate: &str, wanted: &str) -> bool {
        candidate.eq_ignore_ascii_case(wanted)
            || candidate
                .strip_suffix(".exe")
                .is_some_and(|stem| stem.eq_ignore_ascii_case(wanted))
    }

    /// Find a process by executable name (with or without `.exe`).
    pub fn find_process(process_name: &str) -> Result<ProcessInfo> {
        // SAFETY: the snapshot handle is closed before returning on every path.
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
                .map_err(|e| Error::ProcessOpenFailed(format!("process snapshot: {e}")))?;

            let mut entry = PROCESSENTRY32W {
                dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
                ..Default::default()
            };

            let mut found = None;
            if Process32FirstW(snapshot, &mut entry).is_ok() {
                loop {
                    let name = wide_to_string(&entry.szExeFile);
                    if name_matches(&name, process_name) {
                        found = Some(ProcessInfo {
                            pid: entry.th32ProcessID,
                            name,
                        });
                        break;
                    }
                    if Process32NextW(snapshot, &mut entry).is_err() {
                        break;
                    }
                }
            }

            let _ = CloseHandle(snapshot);
            found.ok_or_else(|| Error::ProcessNotFound(process_name.to_string()))
        }
    }

    /// Locate the main module of a process (base address and size).
    fn find_main_module(pid: u32, process_name: &str) -> Result<(u64, usize)> {
        // SAFETY: the snapshot handle is closed before returning on every path.
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid)
                .map_err(|e| Error::ProcessOpenFailed(format!("module snapshot: {e}")))?;

            let mut entry = MODULEENTRY32W {
                dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
                ..Default::default()
            };

            let mut found = None;
            if Module32FirstW(snapshot, &mut entry).is_ok() {
                loop {
                    let name = wide_to_string(&entry.szModule);
                    // The first module in the snapshot is the executable itself.
                    if found.is_none() || name_matches(&name, process_name) {
                        found = Some((entry.modBaseAddr as u64, entry.modBaseSize as usize));
                        if name_matches(&name, process_name) {
                            break;
                        }
                    }
                    if Module32NextW(snapshot, &mut entry).is_err() {
                        break;
                    }
                }
            }

            let _ = CloseHandle(snapshot);
            found.ok_or_else(|| {
                Error::ProcessOpenFailed(format!("main module of '{process_name}' not found"))
            })
        }
    }

    impl ProcessHandle {
        /// Find a process by name and open it with read/query rights.
        pub fn open_by_name(process_name: &str) -> Result<Self> {
            let info = find_process(process_name)?;
            Self::open(info.pid, &info.name)
        }

        /// Open a process by pid with read/query rights.
        pub fn open(pid: u32, process_name: &str) -> Result<Self> {
            // SAFETY: OpenProcess returns an owned handle; it is stored in
            // the ProcessHandle and closed on drop.
            let handle: HANDLE = unsafe {
                OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, pid)
                    .map_err(|e| Error::ProcessOpenFailed(format!("pid {pid}: {e}")))?
            };

            let (base, module_size) = match find_main_module(pid, process_name) {
                Ok(module) => module,
                Err(e) => {
                    // SAFETY: handle was just opened and is not used afterwards.
                    unsafe {
                        let _ = CloseHandle(handle);
                    }
                    return Err(e);
                }
            };

            info!(
                "Attached to {} (pid {}), module base {:#x}, size {:#x}",
                process_name, pid, base, module_size
            );

            Ok(Self {
                handle,
                pid,
                name: process_name.to_string(),
                base,
                module_size,
            })
        }

        pub(super) fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
            let mut bytes_read = 0usize;
            // SAFETY: the buffer outlives the call and the length passed
            // matches its size; a dead target makes the call fail, not crash.
            let status = unsafe {
                ReadProcessMemory(
                    self.handle,
                    address as *const std::ffi::c_void,
                    buffer.as_mut_ptr() as *mut std::ffi::c_void,
                    buffer.len(),
                    Some(&mut bytes_read),
                )
            };

            match status {
                Ok(()) => Ok(bytes_read),
                Err(e) => Err(Error::MemoryReadFailed {
                    address,
                    message: e.to_string(),
                }),
            }
        }
    }

    impl Drop for ProcessHandle {
        fn drop(&mut self) {
            debug!("Closing handle to pid {}", self.pid);
            // SAFETY: the handle was opened by OpenProcess and is dropped once.
            unsafe {
                let _ = CloseHandle(self.handle);
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
mod imp {
    use super::*;

    /// Find a process by executable name (with or without `.exe`).
    pub fn find_process(process_name: &str) -> Result<ProcessInfo> {
        let _ = process_name;
        Err(Error::ProcessOpenFailed(
            "process attach is only supported on Windows".to_string(),
        ))
    }

    impl ProcessHandle {
        /// Find a process by name and open it with read/query rights.
        pub fn open_by_name(process_name: &str) -> Result<Self> {
            let _ = process_name;
            Err(Error::ProcessOpenFailed(
                "process attach is only supported on Windows".to_string(),
            ))
        }

        /// Open a process by pid with read/query rights.
        pub fn open(pid: u32, process_name: &str) -> Result<Self> {
            let _ = (pid, process_name);
            Err(Error::ProcessOpenFailed(
                "process attach is only supported on Windows".to_string(),
            ))
        }

        pub(super) fn read_into(&self, address: u64, _buffer: &mut [u8]) -> Result<usize> {
            Err(Error::MemoryReadFailed {
                address,
                message: "process reads are only supported on Windows".to_string(),
            })
        }
    }
}

pub use imp::find_process;

impl ReadMemory for ProcessHandle {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let bytes_read = self.read_into(address, &mut buffer)?;
        if bytes_read < size {
            return Err(Error::ShortRead {
                address,
                expected: size,
                actual: bytes_read,
            });
        }
        Ok(buffer)
    }

    fn base_address(&self) -> u64 {
        self.base
    }

    fn module_size(&self) -> usize {
        self.module_size
    }
}
