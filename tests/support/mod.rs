pub mod relations;
