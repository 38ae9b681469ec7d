// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::calendar::DateKey;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// The admin-configured submission window for one month.
///
/// An absent bound leaves that side of the range open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftWindow {
    /// First date staff may edit.
    #[serde(default)]
    pub start_date: Option<DateKey>,
    /// Last date staff may edit.
    #[serde(default)]
    pub end_date: Option<DateKey>,
    /// Whether all writes are refused.
    #[serde(default)]
    pub locked: bool,
    /// Message shown to staff.
    #[serde(default)]
    pub admin_message: String,
}

impl ShiftWindow {
    /// Creates a validated window.
    ///
    /// # Errors
    ///
    /// Returns an error if both bounds are present and `start_date > end_date`.
    pub fn new(
        start_date: Option<DateKey>,
        end_date: Option<DateKey>,
        locked: bool,
        admin_message: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let window: Self = Self {
            start_date,
            end_date,
            locked,
            admin_message: admin_message.into(),
        };
        window.validate()?;
        Ok(window)
    }

    /// Checks the range invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if both bounds are present and `start_date > end_date`.
    pub fn validate(&self) -> Result<(), DomainError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => Err(DomainError::InvalidWindowRange {
                start: start.to_string(),
                end: end.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Whether `date` falls within the configured range.
    #[must_use]
    pub fn covers(&self, date: DateKey) -> bool {
        self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
    }
}

/// The window state for a month as seen by staff.
///
/// `NotConfigured` is distinct from a locked window: with no window
/// document, staff writes are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "window", rename_all = "snake_case")]
pub enum WindowState {
    /// No window document exists for the month.
    NotConfigured,
    /// A window document exists.
    Configured(ShiftWindow),
}

impl WindowState {
    /// The configured window, if any.
    #[must_use]
    pub const fn window(&self) -> Option<&ShiftWindow> {
        match self {
            Self::NotConfigured => None,
            Self::Configured(window) => Some(window),
        }
    }

    /// Whether the window is configured and locked.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Configured(window) if window.locked)
    }

    /// Checks whether staff may write the day document for `date`.
    ///
    /// # Errors
    ///
    /// Returns `DateOutsideWindow` if the date is outside a configured range,
    /// or `WindowLocked` if the window is locked.
    pub fn check_writable(&self, date: DateKey) -> Result<(), DomainError> {
        let Self::Configured(window) = self else {
            return Ok(());
        };
        if !window.covers(date) {
            return Err(DomainError::DateOutsideWindow {
                date: date.to_string(),
            });
        }
        if window.locked {
            return Err(DomainError::WindowLocked {
                date: date.to_string(),
            });
        }
        Ok(())
    }
}
