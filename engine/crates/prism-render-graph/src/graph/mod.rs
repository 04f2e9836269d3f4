pub mod dependency_builder;
pub mod node;
pub mod registry;
pub mod render_graph;
