//! Cosmetic side effects fired after a successful submission. Nothing here
//! feeds back into wizard state.

use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Parameters for the confetti burst shown on the success screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfettiBurst {
    pub particle_count: u16,
    pub spread: u16,
    pub origin_y: f32,
    pub colors: Vec<&'static str>,
}

impl Default for ConfettiBurst {
    fn default() -> Self {
        Self {
            particle_count: 150,
            spread: 70,
            origin_y: 0.6,
            colors: vec!["#ffffff", "#000000", "#333333"],
        }
    }
}

pub trait Celebration: Send + Sync {
    fn celebrate(&self, burst: &ConfettiBurst);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoCelebration;

impl Celebration for NoCelebration {
    fn celebrate(&self, _burst: &ConfettiBurst) {}
}

/// Remembers the burst so an HTTP client can render it.
#[derive(Debug, Default, Clone)]
pub struct CelebrationSlot {
    burst: Arc<Mutex<Option<ConfettiBurst>>>,
}

impl CelebrationSlot {
    pub fn take(&self) -> Option<ConfettiBurst> {
        match self.burst.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Celebration for CelebrationSlot {
    fn celebrate(&self, burst: &ConfettiBurst) {
        match self.burst.lock() {
            Ok(mut guard) => *guard = Some(burst.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(burst.clone()),
        }
    }
}
