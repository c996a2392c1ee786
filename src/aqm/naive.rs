use std::collections::VecDeque;

use super::HookPoint;
use crate::{item::Item, time::Millis};

/// No drops, ever. The baseline strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveState;

impl NaiveState {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&mut self, _point: HookPoint, _now: Millis, _queue: &mut VecDeque<Item>) -> Vec<Item> {
        Vec::new()
    }

    pub fn on_join(&mut self, _now: Millis) {}
}
