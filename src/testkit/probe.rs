//! Scripted health probe.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ProbeError;
use crate::port::outbound::probe::HealthProbe;

#[derive(Debug, Clone, Copy)]
enum Script {
    /// Fails this many times, then succeeds.
    HealthyAfter(u32),
    Status(u16),
}

/// Health probe answering from a per-URL script.
///
/// URLs without a script are unreachable.
#[derive(Default)]
pub struct ScriptedProbe {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `url` answers 200 on the first probe.
    #[must_use]
    pub fn healthy(self, url: &str) -> Self {
        self.healthy_after(url, 0)
    }

    /// `url` is unreachable for `failures` probes, then answers 200.
    #[must_use]
    pub fn healthy_after(self, url: &str, failures: u32) -> Self {
        self.scripts
            .lock()
            .insert(url.to_string(), Script::HealthyAfter(failures));
        self
    }

    /// `url` always answers with `status`.
    #[must_use]
    pub fn status(self, url: &str, status: u16) -> Self {
        self.scripts
            .lock()
            .insert(url.to_string(), Script::Status(status));
        self
    }

    #[must_use]
    pub fn calls(&self, url: &str) -> u32 {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        let attempt = {
            let mut calls = self.calls.lock();
            let count = calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let script = self.scripts.lock().get(url).copied();
        match script {
            Some(Script::HealthyAfter(failures)) if attempt > failures => Ok(()),
            Some(Script::Status(status)) if (200..300).contains(&status) => Ok(()),
            Some(Script::Status(status)) => Err(ProbeError::Status(status)),
            _ => Err(ProbeError::Transport("connection refused".into())),
        }
    }
}
