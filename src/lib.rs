pub mod camera;
pub mod canvas;
pub mod integrator;
pub mod interactive;
pub mod lighting;
pub mod math;
pub mod parser;
pub mod ray;
pub mod scene;
pub mod shape;
pub mod transform;
