//! # config
//! Construction parameters of the runtime. The defaults describe the
//! standard x86_64 layout expected by code compiled with
//! `-fsanitize=address`, embedders which map the shadow elsewhere override
//! them before calling [`crate::install`].
use log::LevelFilter;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{
    GuestAddr,
    report::ReportGeometry,
    shadow::{ShadowLayout, ShadowLayoutError},
};

#[derive(TypedBuilder, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsanConfig {
    #[builder(default = ShadowLayout::DEFAULT_SHADOW_START)]
    pub shadow_start: GuestAddr,
    #[builder(default = ShadowLayout::DEFAULT_SHADOW_SHIFT)]
    pub shadow_shift: u32,
    #[builder(default = ShadowLayout::DEFAULT_SHADOW_LENGTH)]
    pub shadow_length: usize,
    /// Width of the redzones placed either side of an `alloca` buffer
    #[builder(default = AsanConfig::DEFAULT_ALLOCA_REDZONE_SIZE)]
    pub alloca_redzone_size: usize,
    /// Shadow bytes printed per row of a report
    #[builder(default = ReportGeometry::DEFAULT_WIDTH)]
    pub report_width: usize,
    /// Rows printed either side of the faulting row of a report
    #[builder(default = ReportGeometry::DEFAULT_LINES)]
    pub report_lines: usize,
    /// Level of the stderr logger installed with the runtime, none is
    /// installed when unset.
    #[builder(default = None, setter(strip_option))]
    pub log_level: Option<LevelFilter>,
}

impl AsanConfig {
    pub const DEFAULT_ALLOCA_REDZONE_SIZE: usize = 32;

    pub fn layout(&self) -> Result<ShadowLayout, ConfigError> {
        Ok(ShadowLayout::new(
            self.shadow_start,
            self.shadow_shift,
            self.shadow_length,
        )?)
    }

    pub fn geometry(&self) -> Result<ReportGeometry, ConfigError> {
        if self.report_width == 0 {
            Err(ConfigError::InvalidReportWidth(self.report_width))?;
        }

        // The dump spans `2 * lines + 1` rows of `width` bytes.
        let rows = self
            .report_lines
            .checked_mul(2)
            .and_then(|n| n.checked_add(1));
        if rows
            .and_then(|n| n.checked_mul(self.report_width))
            .is_none()
        {
            Err(ConfigError::InvalidReportLines(self.report_lines))?;
        }

        Ok(ReportGeometry {
            width: self.report_width,
            lines: self.report_lines,
        })
    }

    /// Checks the redzone width against `layout`, it must be a power of two
    /// covering at least one granule.
    pub fn alloca_redzone_size(&self, layout: &ShadowLayout) -> Result<usize, ConfigError> {
        let size = self.alloca_redzone_size;
        if !size.is_power_of_two() || size < layout.granule_size() {
            Err(ConfigError::InvalidRedzoneSize(size))?;
        }
        Ok(size)
    }
}

impl Default for AsanConfig {
    fn default() -> Self {
        AsanConfig::builder().build()
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConfigError {
    #[error("Invalid shadow layout: {0}")]
    Layout(#[from] ShadowLayoutError),
    #[error("Invalid alloca redzone size: {0:#x}")]
    InvalidRedzoneSize(usize),
    #[error("Invalid report width: {0}")]
    InvalidReportWidth(usize),
    #[error("Invalid report lines: {0}")]
    InvalidReportLines(usize),
}
