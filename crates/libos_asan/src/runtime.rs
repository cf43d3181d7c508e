//! # runtime
//! The runtime context. [`Asan`] bundles the shadow memory with the
//! collaborators used when a violation is found: the [`LineSink`] receiving
//! the report and the [`Abort`] implementation terminating the process.
//!
//! Instrumented code has no way of passing a context to the runtime, so the
//! entry points in [`crate::callbacks`] use a process wide [`DefaultAsan`].
//! The embedding environment should call [`install`] once during bootstrap,
//! after mapping the shadow memory. If it does not, the first call to
//! [`runtime`] installs the default configuration.
use core::marker::PhantomData;

use log::{LevelFilter, SetLoggerError, debug};
use spin::Once;
use thiserror::Error;

use crate::{
    GuestAddr, arch,
    config::{AsanConfig, ConfigError},
    exit::{Abort, ProcessAbort},
    redzone,
    report::{
        AccessKind, ReportGeometry, Reporter, Violation,
        sink::{LineSink, LogSink},
    },
    shadow::{GuestShadow, ShadowLayout},
};

pub type DefaultAsan = Asan<LogSink, ProcessAbort>;

static RUNTIME: Once<DefaultAsan> = Once::new();

pub struct Asan<S: LineSink, A: Abort> {
    shadow: GuestShadow,
    alloca_redzone_size: usize,
    geometry: ReportGeometry,
    sink: S,
    _phantom: PhantomData<fn() -> A>,
}

impl<S: LineSink, A: Abort> Asan<S, A> {
    /// # Safety
    /// The shadow region described by `config` must be mapped readable and
    /// writeable for the lifetime of the returned value.
    pub unsafe fn new(config: &AsanConfig, sink: S) -> Result<Asan<S, A>, ConfigError> {
        let layout = config.layout()?;
        let alloca_redzone_size = config.alloca_redzone_size(&layout)?;
        let geometry = config.geometry()?;
        let shadow = unsafe { GuestShadow::new(layout) };
        Ok(unsafe { Asan::from_parts(shadow, alloca_redzone_size, geometry, sink) })
    }

    const unsafe fn from_parts(
        shadow: GuestShadow,
        alloca_redzone_size: usize,
        geometry: ReportGeometry,
        sink: S,
    ) -> Asan<S, A> {
        Asan {
            shadow,
            alloca_redzone_size,
            geometry,
            sink,
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn shadow(&self) -> &GuestShadow {
        &self.shadow
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn alloca_redzone_size(&self) -> usize {
        self.alloca_redzone_size
    }

    /// Validates an access of `size` bytes at `addr`, a failing access is
    /// reported and never returns.
    #[inline]
    pub fn check(&self, addr: GuestAddr, size: usize, kind: AccessKind, entry: GuestAddr) {
        if self.shadow.is_poison(addr, size) {
            self.report(addr, size, kind, entry);
        }
    }

    #[inline]
    pub fn load(&self, addr: GuestAddr, size: usize, entry: GuestAddr) {
        self.check(addr, size, AccessKind::Load, entry);
    }

    #[inline]
    pub fn store(&self, addr: GuestAddr, size: usize, entry: GuestAddr) {
        self.check(addr, size, AccessKind::Store, entry);
    }

    pub fn report_load(&self, addr: GuestAddr, size: usize, entry: GuestAddr) -> ! {
        self.report(addr, size, AccessKind::Load, entry)
    }

    pub fn report_store(&self, addr: GuestAddr, size: usize, entry: GuestAddr) -> ! {
        self.report(addr, size, AccessKind::Store, entry)
    }

    /// Emits the report for an invalid access, then aborts. `entry` is the
    /// address of the entry point invoked by the instrumented code, the
    /// faulting instruction is recovered from its caller where possible.
    #[cold]
    pub fn report(
        &self,
        addr: GuestAddr,
        size: usize,
        kind: AccessKind,
        entry: GuestAddr,
    ) -> ! {
        let ip = arch::caller_ip(entry);
        let violation = Violation::locate(&self.shadow, ip, addr, size, kind);
        Reporter::new(&self.shadow, &self.sink, self.geometry, A::NAME).emit(&violation);
        A::abort()
    }

    pub fn alloca_poison(&self, base: GuestAddr, size: usize) {
        redzone::alloca_poison(&self.shadow, self.alloca_redzone_size, base, size);
    }

    pub fn allocas_unpoison(&self, top: GuestAddr, bottom: GuestAddr) {
        redzone::allocas_unpoison(&self.shadow, top, bottom);
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum InstallError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Runtime already installed")]
    AlreadyInstalled,
}

/// Installs the process wide runtime. When the host already registered a
/// logger, that logger receives the reports and only the maximum level is
/// taken from [`AsanConfig::log_level`].
///
/// # Safety
/// The shadow region described by `config` must be mapped readable and
/// writeable for the remaining lifetime of the process.
pub unsafe fn install(config: &AsanConfig) -> Result<&'static DefaultAsan, InstallError> {
    let mut installed = false;
    let asan = RUNTIME.try_call_once(|| {
        let asan = unsafe { DefaultAsan::new(config, LogSink) }?;
        installed = true;
        Ok::<DefaultAsan, InstallError>(asan)
    })?;

    if !installed {
        Err(InstallError::AlreadyInstalled)?;
    }

    if let Some(level) = config.log_level {
        // A logger registered by the host takes the output instead.
        if initialize_logger(level).is_err() {
            log::set_max_level(level);
        }
    }

    debug!(
        "install - shadow: {:#x?}, shift: {}",
        asan.shadow.layout().shadow_range(),
        asan.shadow.layout().shift()
    );
    Ok(asan)
}

/// Returns the process wide runtime, installing the default configuration
/// with an error level stderr logger if [`install`] has not been called.
///
/// # Safety
/// If no runtime was installed, the default shadow region
/// ([`ShadowLayout::DEFAULT`]) must be mapped.
#[inline]
pub unsafe fn runtime() -> &'static DefaultAsan {
    RUNTIME.call_once(|| {
        // Another logger may already be present, reports then go to it.
        let _ = initialize_logger(LevelFilter::Error);
        unsafe {
            Asan::from_parts(
                GuestShadow::new(ShadowLayout::DEFAULT),
                AsanConfig::DEFAULT_ALLOCA_REDZONE_SIZE,
                ReportGeometry::default(),
                LogSink,
            )
        }
    })
}

#[cfg(feature = "libc")]
fn initialize_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    match level.to_level() {
        Some(level) => crate::logger::libc::LibcLogger::initialize(level),
        None => Ok(()),
    }
}

#[cfg(all(feature = "linux", target_os = "linux", not(feature = "libc")))]
fn initialize_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    match level.to_level() {
        Some(level) => crate::logger::linux::LinuxLogger::initialize(level),
        None => Ok(()),
    }
}

#[cfg(not(any(feature = "libc", all(feature = "linux", target_os = "linux"))))]
fn initialize_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    // No backend, the embedding environment supplies its own logger.
    log::set_max_level(level);
    Ok(())
}
