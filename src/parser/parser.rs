use anyhow::{bail, Context};
use log::{debug, warn};
use nalgebra::{Matrix4, Point3, Vector3};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use super::{
    lexer::{Lexer, Line},
    Error,
};
use crate::{
    camera::{CanvasInfo, LookAtCamera},
    canvas::Color,
    scene::{Scene, ShapeId},
    transform::Transform,
};

type Result<T> = std::result::Result<T, anyhow::Error>;

/// Everything a scene file describes.
#[derive(Debug, Clone)]
pub struct Description {
    pub info: CanvasInfo,
    pub camera: LookAtCamera,
    pub scene: Scene,
}

pub fn parse(input: &str) -> Result<Description> {
    let mut parser = Parser::new();
    for line in Lexer::new(input) {
        parser.command(line)?;
    }
    parser.finish()
}

pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Description> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene file `{}`", path.display()))?;
    parse(&input).with_context(|| format!("failed to parse scene file `{}`", path.display()))
}

struct Parser {
    scene: Scene,
    names: HashMap<String, ShapeId>,
    info: Option<CanvasInfo>,
    position: Point3<f32>,
    target: Point3<f32>,
    up: Vector3<f32>,
}

impl Parser {
    fn new() -> Self {
        Self {
            scene: Scene::default(),
            names: HashMap::new(),
            info: None,
            position: Point3::new(0., 0., 5.),
            target: Point3::origin(),
            up: Vector3::y(),
        }
    }

    fn finish(self) -> Result<Description> {
        let Some(info) = self.info else {
            bail!(Error::MissingImage)
        };

        let Some(camera) = LookAtCamera::new(&info, self.position, self.target, self.up) else {
            bail!(Error::DegenerateCamera)
        };

        Ok(Description {
            info,
            camera,
            scene: self.scene,
        })
    }

    fn command(&mut self, mut line: Line) -> Result<()> {
        match line.command {
            "image" => {
                let width = integer(&mut line, "width")?;
                let height = integer(&mut line, "height")?;
                if width == 0 || height == 0 {
                    bail!(Error::InvalidImage { line: line.number })
                }
                self.info = Some(CanvasInfo::new(width, height));
            }

            "camera_position" => self.position = point(&mut line)?,
            "camera_target" => self.target = point(&mut line)?,
            "camera_up" => self.up = point(&mut line)?.coords,

            "sphere" => {
                let center = point(&mut line)?;
                let radius = number(&mut line, "radius")?;
                let color = color(&mut line)?;
                self.scene.sphere(center, radius, color);
            }

            "triangle" => {
                let a = point(&mut line)?;
                let b = point(&mut line)?;
                let c = point(&mut line)?;
                let color = color(&mut line)?;
                self.scene.triangle(a, b, c, color);
            }

            "box" => {
                let center = point(&mut line)?;
                let size = number(&mut line, "size")?;
                let color = color(&mut line)?;
                self.scene.cube(center, size, color);
            }

            "cylinder" => {
                let center = point(&mut line)?;
                let radius = number(&mut line, "radius")?;
                let height = number(&mut line, "height")?;
                let color = color(&mut line)?;
                self.scene.cylinder(center, radius, height, color);
            }

            "plane" => {
                let point = point(&mut line)?;
                let normal = point_field(&mut line, "normal")?.coords;
                let color = color(&mut line)?;
                self.scene.plane(point, normal, color);
            }

            "name" => {
                let name = word(&mut line, "name")?;
                let id = self.current(&line)?;
                self.names.insert(name.to_string(), id);
            }

            "parent" => {
                let name = word(&mut line, "name")?;
                let child = self.current(&line)?;
                match self.names.get(name) {
                    Some(&parent) if parent == child => bail!(Error::SelfParent {
                        line: line.number,
                        name: name.to_string(),
                    }),
                    Some(&parent) => self.scene.add_child(parent, child),
                    None => warn!(
                        "{}, ignoring",
                        Error::UnknownName {
                            line: line.number,
                            name: name.to_string(),
                        }
                    ),
                }
            }

            "transform" => {
                let mut values = [0f32; 16];
                for value in values.iter_mut() {
                    *value = number(&mut line, "matrix entry")?;
                }

                // Entries are written one row at a time.
                let matrix = Matrix4::from_row_slice(&values);
                let Some(transform) = Transform::from_matrix(matrix) else {
                    bail!(Error::SingularTransform { line: line.number })
                };

                let id = self.current(&line)?;
                self.scene.set_transform(id, transform);
            }

            other => debug!("line {}: ignoring unknown command `{}`", line.number, other),
        }

        Ok(())
    }

    /// The shape most recently added, which `name`, `parent` and `transform` apply to.
    fn current(&self, line: &Line) -> Result<ShapeId> {
        match self.scene.last() {
            Some(id) => Ok(id),
            None => bail!(Error::NoShape {
                line: line.number,
                command: line.command.to_string(),
            }),
        }
    }
}

fn word<'a>(line: &mut Line<'a>, field: &'static str) -> Result<&'a str> {
    match line.field() {
        Some(text) => Ok(text),
        None => bail!(Error::MissingField {
            line: line.number,
            command: line.command.to_string(),
            field,
        }),
    }
}

fn parsed<T: FromStr>(line: &mut Line, field: &'static str) -> Result<T> {
    let text = word(line, field)?;
    match T::from_str(text) {
        Ok(value) => Ok(value),
        Err(_) => bail!(Error::InvalidNumber {
            line: line.number,
            text: text.to_string(),
        }),
    }
}

fn number(line: &mut Line, field: &'static str) -> Result<f32> {
    parsed(line, field)
}

fn integer(line: &mut Line, field: &'static str) -> Result<u32> {
    parsed(line, field)
}

fn point_field(line: &mut Line, field: &'static str) -> Result<Point3<f32>> {
    let x = number(line, field)?;
    let y = number(line, field)?;
    let z = number(line, field)?;
    Ok(Point3::new(x, y, z))
}

fn point(line: &mut Line) -> Result<Point3<f32>> {
    point_field(line, "coordinates")
}

fn color(line: &mut Line) -> Result<Color> {
    let r = number(line, "color")?;
    let g = number(line, "color")?;
    let b = number(line, "color")?;
    Ok(Color::new(r, g, b))
}
