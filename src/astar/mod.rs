// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod flat;

pub use flat::{find_path, find_path_cancellable};
