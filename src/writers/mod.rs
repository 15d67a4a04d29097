pub mod shapefile_writer;

pub use shapefile_writer::ShapefileWriter;
