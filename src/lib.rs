// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Library entry exposing the assembler core, built-in targets and CLI.
pub mod assembler;
pub mod core;
pub mod targets;
