mod g2o;
mod market;

pub use g2o::{format_g2o, parse_g2o, read_g2o_file, write_g2o, G2oEdge, PoseGraph};
pub use market::{
    format_consistency_graph, format_loop_closures, parse_consistency_graph,
    read_consistency_graph, write_consistency_graph, write_loop_closures,
};
