//! Platform selection, device capability check, and the memory self-test.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::backend::plugins;
use crate::backend::{MemtestMode, Platform};
use crate::bridge::devices::is_supported_device;
use crate::bridge::options::{keys, MemtestSetting, PlatformOptions};
use crate::error::{DiagnosticStage, Error, Result};

/// Resolves the `platform` option against the registered platforms.
///
/// Triggers plugin discovery on first use; a missing plugin installation is
/// reported as [`Error::BackendUnavailable`] rather than a platform miss.
pub fn select_platform(options: &PlatformOptions) -> Result<Arc<dyn Platform>> {
    plugins::ensure_loaded()?;
    let requested = options.get(keys::PLATFORM).unwrap_or_default();
    let available = plugins::platforms();
    let platform = match_platform(&available, requested)?;
    info!("selected the {} platform", platform.name());
    for name in platform.property_names() {
        debug!(
            "platform property {name} = {}",
            platform.property(&name).unwrap_or_default()
        );
    }
    Ok(platform)
}

/// Case-insensitive name match over a platform list.
pub fn match_platform(
    available: &[Arc<dyn Platform>],
    requested: &str,
) -> Result<Arc<dyn Platform>> {
    available
        .iter()
        .find(|p| p.name().eq_ignore_ascii_case(requested))
        .cloned()
        .ok_or_else(|| Error::PlatformNotFound(requested.to_string()))
}

/// Checks the bound device against the supported-hardware table.
///
/// Only accelerator platforms are checked. An unsupported device is fatal
/// unless `force-device=yes`, which downgrades the failure to a warning. A
/// platform that cannot identify its devices is passed through.
pub fn check_device(platform: &dyn Platform, options: &PlatformOptions) -> Result<()> {
    if !platform.is_accelerator() {
        return Ok(());
    }

    let device = options.device_id();
    let Some(name) = platform.device_name(device) else {
        return Ok(());
    };

    if is_supported_device(&name) {
        info!("running on device #{device} ({name})");
        return Ok(());
    }

    if options.force_device() {
        warn!(
            "device #{device} ({name}) is not on the supported-hardware list; proceeding because \
             force-device=yes"
        );
        return Ok(());
    }

    Err(Error::DeviceIncompatible { device, name })
}

/// Runs the device-memory self-test for one stage of the run.
///
/// Skipped silently on non-accelerator platforms and with a warning when
/// `memtest=off`. A nonzero error count is fatal; the post-run stage's error
/// message marks the completed trajectory as unreliable.
pub fn run_memory_test(
    platform: &dyn Platform,
    options: &PlatformOptions,
    stage: DiagnosticStage,
) -> Result<()> {
    if !platform.is_accelerator() {
        return Ok(());
    }

    let mode = match options.memtest() {
        MemtestSetting::Off => {
            warn!(
                "the {stage}-simulation device memory test is disabled; undetected memory errors \
                 would silently corrupt results"
            );
            return Ok(());
        }
        MemtestSetting::Run(mode) => mode,
    };

    let Some(diagnostic) = platform.diagnostics() else {
        return Ok(());
    };

    match mode {
        MemtestMode::Timed(seconds) => {
            info!("running an approximately {seconds} s {stage}-simulation device memory test")
        }
        MemtestMode::Full => info!("running a full {stage}-simulation device memory test"),
    }

    let errors = diagnostic
        .run(mode)
        .map_err(|e| Error::backend("running the device memory test", e))?;
    if errors > 0 {
        return Err(Error::Diagnostic { stage, errors });
    }
    info!("the {stage}-simulation device memory test found no errors");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::system::{BackendSystem, IntegratorSpec};
    use crate::backend::{BackendError, Context, MemoryDiagnostic};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubDiagnostic {
        errors: u64,
        runs: AtomicUsize,
    }

    impl MemoryDiagnostic for StubDiagnostic {
        fn run(&self, _mode: MemtestMode) -> std::result::Result<u64, BackendError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(self.errors)
        }
    }

    struct StubPlatform {
        name: &'static str,
        accelerator: bool,
        device: Option<&'static str>,
        diagnostic: Option<StubDiagnostic>,
    }

    impl StubPlatform {
        fn gpu(name: &'static str, device: &'static str, errors: u64) -> Self {
            Self {
                name,
                accelerator: true,
                device: Some(device),
                diagnostic: Some(StubDiagnostic {
                    errors,
                    runs: AtomicUsize::new(0),
                }),
            }
        }

        fn cpu(name: &'static str) -> Self {
            Self {
                name,
                accelerator: false,
                device: None,
                diagnostic: None,
            }
        }
    }

    impl Platform for StubPlatform {
        fn name(&self) -> &str {
            self.name
        }

        fn is_accelerator(&self) -> bool {
            self.accelerator
        }

        fn set_property(&self, _key: &str, _value: &str) -> std::result::Result<(), BackendError> {
            Ok(())
        }

        fn property(&self, _key: &str) -> Option<String> {
            None
        }

        fn property_names(&self) -> Vec<String> {
            Vec::new()
        }

        fn device_name(&self, _device_id: i64) -> Option<String> {
            self.device.map(str::to_string)
        }

        fn diagnostics(&self) -> Option<&dyn MemoryDiagnostic> {
            self.diagnostic
                .as_ref()
                .map(|d| d as &dyn MemoryDiagnostic)
        }

        fn create_context(
            &self,
            _system: &BackendSystem,
            _integrator: &IntegratorSpec,
        ) -> std::result::Result<Box<dyn Context>, BackendError> {
            Err(BackendError::new("stub platform has no contexts"))
        }
    }

    fn platforms() -> Vec<Arc<dyn Platform>> {
        vec![
            Arc::new(StubPlatform::cpu("Reference")),
            Arc::new(StubPlatform::gpu("CUDA", "GeForce GTX 480", 0)),
        ]
    }

    #[test]
    fn matching_is_case_insensitive() {
        let available = platforms();
        assert_eq!(match_platform(&available, "cuda").unwrap().name(), "CUDA");
        assert_eq!(
            match_platform(&available, "REFERENCE").unwrap().name(),
            "Reference"
        );
    }

    #[test]
    fn unknown_platform_names_the_request() {
        let available = platforms();
        let err = match_platform(&available, "OpenCL").unwrap_err();
        assert!(matches!(err, Error::PlatformNotFound(name) if name == "OpenCL"));
    }

    #[test]
    fn supported_device_passes_the_check() {
        let platform = StubPlatform::gpu("CUDA", "GeForce GTX 480", 0);
        let options = PlatformOptions::parse("").unwrap();
        check_device(&platform, &options).unwrap();
    }

    #[test]
    fn unsupported_device_fails_unless_forced() {
        let platform = StubPlatform::gpu("CUDA", "Mystery Accelerator 9000", 0);
        let options = PlatformOptions::parse("").unwrap();
        let err = check_device(&platform, &options).unwrap_err();
        assert!(matches!(err, Error::DeviceIncompatible { device: 0, .. }));

        let forced = PlatformOptions::parse("force-device=yes").unwrap();
        check_device(&platform, &forced).unwrap();
    }

    #[test]
    fn cpu_platform_skips_device_check_and_memtest() {
        let platform = StubPlatform::cpu("Reference");
        let options = PlatformOptions::parse("").unwrap();
        check_device(&platform, &options).unwrap();
        run_memory_test(&platform, &options, DiagnosticStage::Pre).unwrap();
    }

    #[test]
    fn memtest_off_never_invokes_the_diagnostic() {
        let platform = StubPlatform::gpu("CUDA", "GeForce GTX 480", 3);
        let options = PlatformOptions::parse("memtest=off").unwrap();
        run_memory_test(&platform, &options, DiagnosticStage::Pre).unwrap();
        assert_eq!(
            platform.diagnostic.as_ref().unwrap().runs.load(Ordering::SeqCst),
            0
        );
    }

    #[test]
    fn memory_errors_are_fatal_with_the_stage_attached() {
        let platform = StubPlatform::gpu("CUDA", "GeForce GTX 480", 2);
        let options = PlatformOptions::parse("memtest=30").unwrap();
        let err = run_memory_test(&platform, &options, DiagnosticStage::Post).unwrap_err();
        match err {
            Error::Diagnostic { stage, errors } => {
                assert_eq!(stage, DiagnosticStage::Post);
                assert_eq!(errors, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(
            platform.diagnostic.as_ref().unwrap().runs.load(Ordering::SeqCst),
            1
        );
    }

    #[test]
    fn clean_memtest_passes() {
        let platform = StubPlatform::gpu("CUDA", "GeForce GTX 480", 0);
        let options = PlatformOptions::parse("memtest=full").unwrap();
        run_memory_test(&platform, &options, DiagnosticStage::Pre).unwrap();
    }
}
