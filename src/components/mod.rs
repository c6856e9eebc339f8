pub mod insight_graph;
