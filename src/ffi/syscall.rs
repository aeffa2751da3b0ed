use std::fs::File;
use std::io::{Error, Result};
use std::os::fd::{AsRawFd, FromRawFd};

use perf_event_open_sys::ioctls;

use super::Attr;

pub fn perf_event_open(attr: &Attr, pid: i32, cpu: i32, group_fd: i32, flags: u64) -> Result<File> {
    let num = libc::SYS_perf_event_open;
    let fd = unsafe { libc::syscall(num, attr as *const Attr, pid, cpu, group_fd, flags) };
    if fd != -1 {
        Ok(unsafe { File::from_raw_fd(fd as _) })
    } else {
        Err(Error::last_os_error())
    }
}

// All counting ioctls take either no argument or `PERF_IOC_FLAG_GROUP`.
macro_rules! ioctl_flags {
    ($name:ident, $op:ident) => {
        pub fn $name(file: &File, flags: u32) -> Result<()> {
            let fd = file.as_raw_fd();
            let result = unsafe { ioctls::$op(fd, flags as _) };
            if result != -1 {
                Ok(())
            } else {
                Err(Error::last_os_error())
            }
        }
    };
}

ioctl_flags!(enable, ENABLE);
ioctl_flags!(disable, DISABLE);
ioctl_flags!(reset, RESET);

pub fn id(file: &File) -> Result<u64> {
    let fd = file.as_raw_fd();
    let mut id = 0u64;
    let result = unsafe { ioctls::ID(fd, &mut id as *mut u64) };
    if result != -1 {
        Ok(id)
    } else {
        Err(Error::last_os_error())
    }
}

pub fn read(file: &File, buf: &mut [u8]) -> Result<usize> {
    let fd = file.as_raw_fd();
    let count = buf.len();
    let buf = buf.as_mut_ptr() as _;
    let bytes = unsafe { libc::read(fd, buf, count) };
    if bytes != -1 {
        Ok(bytes as _)
    } else {
        Err(Error::last_os_error())
    }
}
