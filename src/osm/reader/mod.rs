// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::convert::Infallible;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use graph_builder::GraphBuilder;

use crate::osm::Profile;
use crate::{earth_distance, DataError, Error, Graph};

mod graph_builder;
mod model;
mod xml;

pub use model::{Feature, RawNode, Way};

/// Kilometers per degree of latitude.
const KM_PER_DEGREE_LAT: f64 = 110.574;

/// Kilometers per degree of longitude at the equator.
const KM_PER_DEGREE_LON: f64 = 111.320;

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format from the first bytes of a file.
    fn detect(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            Self::XmlGz
        } else if magic.starts_with(b"BZh") {
            Self::XmlBz2
        } else {
            Self::Xml
        }
    }
}

/// Circular area of interest: a center point and a radius in kilometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
}

impl Extent {
    /// Returns the bounding box enclosing the extent, as
    /// `[min_lon, min_lat, max_lon, max_lat]`, suitable for requesting map data.
    pub fn bbox(&self) -> [f64; 4] {
        let d_lat = self.radius / KM_PER_DEGREE_LAT;
        let d_lon = self.radius / (KM_PER_DEGREE_LON * self.lat.to_radians().cos());
        [
            self.lon - d_lon,
            self.lat - d_lat,
            self.lon + d_lon,
            self.lat + d_lat,
        ]
    }

    /// Checks whether a point lies within [Extent::radius] of the center.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        earth_distance(self.lat, self.lon, lat, lon) <= self.radius
    }

    fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.radius.is_finite() && self.radius > 0.0
    }
}

/// Additional controls for interpreting OSM data as a [Graph].
#[derive(Debug, Clone, Copy)]
pub struct Options<'a> {
    /// Which OSM ways should be converted into a [Graph].
    pub profile: &'a Profile<'a>,

    /// Format of the input data.
    pub file_format: FileFormat,

    /// Only keep nodes within the given extent. Nodes outside of it are treated
    /// as absent from the map data. Ignored if [None], or if any of its values
    /// is not finite, or the radius isn't positive.
    pub extent: Option<Extent>,
}

/// Internal trait for objects which can stream [osm features](Feature)
/// from an underlying source.
trait FeatureReader {
    fn next_feature(&mut self) -> Result<Option<Feature>, DataError>;
}

impl<I, E> FeatureReader for I
where
    I: Iterator<Item = Result<Feature, E>>,
    DataError: From<E>,
{
    fn next_feature(&mut self) -> Result<Option<Feature>, DataError> {
        self.next().transpose().map_err(DataError::from)
    }
}

/// Builds a [Graph] out of already-parsed OSM features, as per the provided [Options].
/// [Options::file_format] is ignored.
pub fn build_graph<I: IntoIterator<Item = Feature>>(
    features: I,
    options: &Options<'_>,
) -> Result<Graph, Error> {
    GraphBuilder::new(options).add_features(features.into_iter().map(Ok::<_, Infallible>))
}

/// Parse OSM features from a reader into a [Graph] as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn load_from_io<R: io::Read>(options: &Options<'_>, reader: R) -> Result<Graph, Error> {
    let mut b = io::BufReader::new(reader);
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        f => f,
    };

    match format {
        FileFormat::Unknown | FileFormat::Xml => {
            let r = xml::Reader::from_io(b);
            GraphBuilder::new(options).add_features(r)
        }

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            GraphBuilder::new(options).add_features(r)
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            GraphBuilder::new(options).add_features(r)
        }
    }
}

/// Parse OSM features from a file at the provided path into a [Graph] as per the provided [Options].
pub fn load_from_file<P: AsRef<Path>>(options: &Options<'_>, path: P) -> Result<Graph, Error> {
    let f = File::open(path)?;
    load_from_io(options, f)
}

/// Parse OSM features from a static buffer into a [Graph] as per the provided [Options].
pub fn load_from_buffer(options: &Options<'_>, data: &[u8]) -> Result<Graph, Error> {
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data),
        f => f,
    };

    if format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        let r = xml::Reader::from_buffer(data);
        GraphBuilder::new(options).add_features(r)
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let options = Options {
            file_format: format,
            ..*options
        };
        load_from_io(&options, data)
    }
}
