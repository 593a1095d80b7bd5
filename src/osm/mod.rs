// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Conversion of [OpenStreetMap](https://www.openstreetmap.org/) data into a [Graph](crate::Graph).
//!
//! Every accepted way is split into [Edges](crate::Edge) at junctions, that is at nodes
//! referenced more than once by accepted ways. Nodes in the middle of an edge are kept
//! in the graph to describe its shape, but have no incident edges.

mod profile;
mod reader;

pub use profile::{Profile, ANY_WAY_PROFILE, FOOT_PROFILE};
pub use reader::{
    build_graph, load_from_buffer, load_from_file, load_from_io, Extent, Feature, FileFormat,
    Options, RawNode, Way,
};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{earth_distance, DataError, Error, Graph, LENGTH_EPSILON};

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-9),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    const GRID_XML: &[u8] = include_bytes!("reader/test_fixtures/grid.osm");
    const GRID_GZ: &[u8] = include_bytes!("reader/test_fixtures/grid.osm.gz");
    const GRID_BZ2: &[u8] = include_bytes!("reader/test_fixtures/grid.osm.bz2");

    fn foot_options(file_format: FileFormat) -> Options<'static> {
        Options {
            profile: &FOOT_PROFILE,
            file_format,
            extent: None,
        }
    }

    fn find_edge<'g>(g: &'g Graph, nodes: &[i64]) -> Option<&'g crate::Edge> {
        g.edges().iter().find(|e| {
            e.nodes == nodes || e.nodes.iter().rev().cloned().eq(nodes.iter().cloned())
        })
    }

    /// Expected edge length: great-circle distances between consecutive nodes,
    /// each segment nudged by [LENGTH_EPSILON].
    fn polyline_distance(g: &Graph, nodes: &[i64]) -> f64 {
        nodes
            .windows(2)
            .map(|pair| {
                let a = g.get_node(pair[0]).unwrap();
                let b = g.get_node(pair[1]).unwrap();
                earth_distance(a.lat, a.lon, b.lat, b.lon) + LENGTH_EPSILON
            })
            .sum()
    }

    fn check_grid_graph(g: &Graph) {
        //  1───2───3
        //  │   │    \
        //  │   │     8
        //  │   │    /
        //  4───5───6
        //      │
        //      7

        // -20 is not used by any way, -10..-12 belong to a building,
        // -99 is referenced but missing
        assert_eq!(g.len(), 8);
        assert!(g.get_node(-20).is_none());
        assert!(g.get_node(-10).is_none());
        assert!(g.get_node(-99).is_none());

        // Ways are split at junctions, -8 only describes the geometry
        assert_eq!(g.edges().len(), 8);
        for edge in [
            &[-1, -2][..],
            &[-2, -3],
            &[-4, -5],
            &[-5, -6],
            &[-2, -5],
            &[-5, -7],
            &[-1, -4],
            &[-3, -8, -6],
        ] {
            assert!(find_edge(g, edge).is_some(), "missing edge {edge:?}");
        }

        assert_eq!(g.get_node(-2).unwrap().edges.len(), 3);
        assert_eq!(g.get_node(-5).unwrap().edges.len(), 4);
        assert_eq!(g.get_node(-7).unwrap().edges.len(), 1);
        assert!(!g.get_node(-8).unwrap().is_significant());

        // Edge lengths are sums of their segments
        for e in g.edges() {
            assert_almost_eq!(e.length, polyline_distance(g, &e.nodes));
        }
        assert_almost_eq!(
            find_edge(g, &[-3, -8, -6]).unwrap().length,
            earth_distance(52.231, 21.002, 52.2305, 21.0025)
                + earth_distance(52.2305, 21.0025, 52.23, 21.002)
                + 2.0 * LENGTH_EPSILON
        );
        assert_almost_eq!(
            find_edge(g, &[-2, -5]).unwrap().length,
            earth_distance(52.231, 21.001, 52.23, 21.001) + LENGTH_EPSILON
        );
    }

    #[test]
    fn build_graph_xml_round_trip() {
        let g = load_from_buffer(&foot_options(FileFormat::Xml), GRID_XML).unwrap();
        check_grid_graph(&g);
    }

    #[test]
    fn build_graph_xml_io_round_trip() {
        let g = load_from_io(&foot_options(FileFormat::Xml), GRID_XML).unwrap();
        check_grid_graph(&g);
    }

    #[test]
    fn build_graph_gz_round_trip() {
        let g = load_from_buffer(&foot_options(FileFormat::XmlGz), GRID_GZ).unwrap();
        check_grid_graph(&g);
    }

    #[test]
    fn build_graph_bz2_round_trip() {
        let g = load_from_buffer(&foot_options(FileFormat::XmlBz2), GRID_BZ2).unwrap();
        check_grid_graph(&g);
    }

    #[test]
    fn build_graph_detects_format() {
        for data in [GRID_XML, GRID_GZ, GRID_BZ2] {
            let g = load_from_buffer(&foot_options(FileFormat::Unknown), data).unwrap();
            check_grid_graph(&g);

            let g = load_from_io(&foot_options(FileFormat::Unknown), data).unwrap();
            check_grid_graph(&g);
        }
    }

    #[test]
    fn build_graph_any_way() {
        let options = Options {
            profile: &ANY_WAY_PROFILE,
            file_format: FileFormat::Xml,
            extent: None,
        };
        let g = load_from_buffer(&options, GRID_XML).unwrap();

        // The building and the private footway are added
        assert_eq!(g.len(), 11);
        assert_eq!(g.edges().len(), 11);
        assert!(find_edge(&g, &[-10, -11]).is_some());
        assert!(find_edge(&g, &[-11, -12, -10]).is_some());
        assert!(find_edge(&g, &[-6, -11]).is_some());
        assert_eq!(g.get_node(-6).unwrap().edges.len(), 3);
    }

    #[test]
    fn build_graph_within_extent() {
        let options = Options {
            profile: &FOOT_PROFILE,
            file_format: FileFormat::Xml,
            extent: Some(Extent {
                lat: 52.23,
                lon: 21.001,
                radius: 0.1,
            }),
        };
        let g = load_from_buffer(&options, GRID_XML).unwrap();

        assert_eq!(g.len(), 3);
        assert_eq!(g.edges().len(), 2);
        assert!(find_edge(&g, &[-4, -5]).is_some());
        assert!(find_edge(&g, &[-5, -6]).is_some());
    }

    #[test]
    fn build_graph_from_features() {
        let features = vec![
            Feature::Node(RawNode {
                id: 1,
                lat: 0.0,
                lon: 0.0,
            }),
            Feature::Node(RawNode {
                id: 2,
                lat: 0.0,
                lon: 0.001,
            }),
            Feature::Node(RawNode {
                id: 3,
                lat: 0.001,
                lon: 0.001,
            }),
            Feature::Way(Way {
                id: 10,
                nodes: vec![1, 2, 3],
                tags: HashMap::default(),
            }),
            Feature::Relation(20),
        ];

        let g = build_graph(features, &foot_options(FileFormat::Unknown)).unwrap();
        assert!(g.is_empty());

        let options = Options {
            profile: &ANY_WAY_PROFILE,
            file_format: FileFormat::Unknown,
            extent: None,
        };
        let features = vec![
            Feature::Way(Way {
                id: 10,
                nodes: vec![1, 2, 3],
                tags: HashMap::default(),
            }),
            Feature::Node(RawNode {
                id: 1,
                lat: 0.0,
                lon: 0.0,
            }),
            Feature::Node(RawNode {
                id: 2,
                lat: 0.0,
                lon: 0.001,
            }),
            Feature::Node(RawNode {
                id: 3,
                lat: 0.001,
                lon: 0.001,
            }),
        ];
        let g = build_graph(features, &options).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.edges().len(), 1);
        assert_eq!(g.edges()[0].nodes, vec![1, 2, 3]);
    }

    #[test]
    fn build_graph_way_too_short() {
        const DATA: &[u8] = br#"<osm>
            <node id="1" lat="0.0" lon="0.0"/>
            <way id="10"><nd ref="1"/><tag k="highway" v="footway"/></way>
        </osm>"#;

        assert!(matches!(
            load_from_buffer(&foot_options(FileFormat::Xml), DATA),
            Err(Error::Data(DataError::WayTooShort {
                way_id: 10,
                count: 1
            }))
        ));
    }

    #[test]
    fn build_graph_malformed_xml() {
        const DATA: &[u8] = b"<osm><node id=\"1\" lat=\"0.0\" lon=\"0.0\"></way></osm>";
        assert!(matches!(
            load_from_buffer(&foot_options(FileFormat::Xml), DATA),
            Err(Error::Data(DataError::Xml(_)))
        ));
    }

    #[test]
    fn build_graph_start_node_lookup() {
        let g = load_from_buffer(&foot_options(FileFormat::Xml), GRID_XML).unwrap();

        // -8 is closest, but has no incident edges
        let n = g.find_nearest_node(52.2305, 21.0026).unwrap();
        assert!(n.id == -3 || n.id == -6);
        assert!(n.is_significant());
    }
}
