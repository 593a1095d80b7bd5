// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

/// Describes which OSM ways are converted into a [Graph](crate::Graph).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile<'a> {
    /// Human readable name of the profile, customary the most specific
    /// [access tag](https://wiki.openstreetmap.org/wiki/Key:access).
    /// Used only for logging.
    pub name: &'a str,

    /// Values of the [highway](https://wiki.openstreetmap.org/wiki/Key:highway) tag
    /// of ways which can be used.
    ///
    /// If empty, every way is accepted, regardless of its tags
    /// (subject to [Profile::access] and [Profile::disallow_motorroad]).
    pub highways: &'a [&'a str],

    /// Array of OSM [access tags](https://wiki.openstreetmap.org/wiki/Key:access#Land-based_transportation)
    /// (in order from least to most specific) to consider when checking for prohibitions.
    pub access: &'a [&'a str],

    /// Force no routing over [motorroad=yes](https://wiki.openstreetmap.org/wiki/Key:motorroad) ways.
    pub disallow_motorroad: bool,
}

impl<'a> Profile<'a> {
    /// Checks if a way with the provided tags can be used.
    pub fn is_allowed(&self, tags: &HashMap<String, String>) -> bool {
        // Check against the highway tag
        if !self.highways.is_empty() {
            match tags.get("highway") {
                Some(v) if self.highways.contains(&v.as_str()) => {}
                _ => return false,
            }
        }

        // Check against the motorroad tag
        if self.disallow_motorroad && tags.get("motorroad").map(|v| v.as_str()) == Some("yes") {
            return false;
        }

        // Check against the access tags
        match self
            .access
            .iter()
            .rev()
            .find_map(|&mode| tags.get(mode).map(|v| v.as_str()))
        {
            Some("no") | Some("private") => false,
            _ => true,
        }
    }
}

/// Profile accepting every way present in the map data.
pub const ANY_WAY_PROFILE: Profile = Profile {
    name: "any",
    highways: &[],
    access: &[],
    disallow_motorroad: false,
};

/// Profile for walking and running.
pub const FOOT_PROFILE: Profile = Profile {
    name: "foot",
    highways: &[
        "trunk",
        "trunk_link",
        "primary",
        "primary_link",
        "secondary",
        "secondary_link",
        "tertiary",
        "tertiary_link",
        "unclassified",
        "minor",
        "residential",
        "living_street",
        "track",
        "service",
        "bridleway",
        "footway",
        "path",
        "steps",
        "pedestrian",
        "platform",
        "cycleway",
    ],
    access: &["access", "foot"],
    disallow_motorroad: true,
};
