//! Temporary enabling of the instruments the mutex and stages views need.

use tracing::{info, warn};

use super::{CollectError, MetricsSource};

/// `setup_instruments` name patterns switched on for the session.
pub const INSTRUMENT_PATTERNS: &[&str] = &["wait/synch/mutex/%", "stage/%"];

/// One `setup_instruments` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSetting {
    pub name: String,
    pub enabled: bool,
    pub timed: bool,
}

/// Original settings of every instrument changed at startup.
#[derive(Debug, Default)]
pub struct Instruments {
    saved: Vec<InstrumentSetting>,
}

impl Instruments {
    /// Enables and times every matching instrument.
    ///
    /// Failure is never fatal: on a read-only server or without UPDATE on
    /// `setup_instruments` the views just show what is already instrumented.
    pub fn enable(source: &mut dyn MetricsSource) -> Self {
        let mut saved = Vec::new();
        let disabled = match source.disabled_instruments(INSTRUMENT_PATTERNS) {
            Ok(disabled) => disabled,
            Err(e) => {
                warn!(error = %e, "cannot read setup_instruments");
                return Self { saved };
            }
        };

        for original in disabled {
            let wanted = InstrumentSetting {
                enabled: true,
                timed: true,
                ..original.clone()
            };
            match source.set_instrument(&wanted) {
                Ok(()) => saved.push(original),
                Err(CollectError::AccessDenied(msg)) => {
                    warn!(error = %msg, "not allowed to change setup_instruments");
                    break;
                }
                Err(e) => {
                    warn!(instrument = %wanted.name, error = %e, "failed to enable instrument");
                    break;
                }
            }
        }

        if !saved.is_empty() {
            info!(count = saved.len(), "enabled performance_schema instruments");
        }
        Self { saved }
    }

    /// Number of instruments waiting to be restored.
    pub fn changed(&self) -> usize {
        self.saved.len()
    }

    /// Puts every changed instrument back. Calling it twice is a no-op.
    pub fn restore(&mut self, source: &mut dyn MetricsSource) {
        if self.saved.is_empty() {
            return;
        }
        let count = self.saved.len();
        for original in self.saved.drain(..) {
            if let Err(e) = source.set_instrument(&original) {
                warn!(instrument = %original.name, error = %e, "failed to restore instrument");
            }
        }
        info!(count, "restored performance_schema instruments");
    }
}
