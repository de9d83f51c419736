// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! km8 registry module.

use crate::core::registry::TargetModule;
use crate::core::target::Target;

use super::Km8Target;

pub const TARGET_KM8: &str = "km8";

pub struct Km8TargetModule;

impl TargetModule for Km8TargetModule {
    fn target_id(&self) -> &'static str {
        TARGET_KM8
    }

    fn description(&self) -> &'static str {
        "8-bit reference CPU, 14 general registers, 16-bit addresses"
    }

    fn create(&self) -> Box<dyn Target> {
        Box::new(Km8Target::new())
    }
}
