use anyhow::bail;
use log::info;
use nalgebra::Vector3;
use std::str::FromStr;
use thiserror::Error;

use crate::{
    camera::{CanvasInfo, LookAtCamera},
    canvas::Canvas,
    integrator::{render, RenderConfig},
    parser::Description,
    scene::{Scene, ShapeId},
};

const STEP: f32 = 0.5;
const TURN: f32 = 20.;

/// A single edit applied to the first shape of the scene between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    /// Move in world space.
    Translate(Vector3<f32>),

    /// Turn about the shape's own y axis, in degrees.
    Rotate(f32),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown key `{0}`, expected one of left, right, up, down, q, e")]
pub struct UnknownKey(String);

impl FromStr for Control {
    type Err = UnknownKey;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let control = match key {
            "left" => Control::Translate(Vector3::new(STEP, 0., 0.)),
            "right" => Control::Translate(Vector3::new(-STEP, 0., 0.)),
            "up" => Control::Translate(Vector3::new(0., 0., -STEP)),
            "down" => Control::Translate(Vector3::new(0., 0., STEP)),
            "q" => Control::Rotate(TURN),
            "e" => Control::Rotate(-TURN),
            other => return Err(UnknownKey(other.to_string())),
        };
        Ok(control)
    }
}

/// A scene that is edited and re-rendered one event at a time.
pub struct Session {
    scene: Scene,
    camera: LookAtCamera,
    info: CanvasInfo,
    config: RenderConfig,
    target: ShapeId,
}

impl Session {
    pub fn new(description: Description, config: RenderConfig) -> anyhow::Result<Self> {
        let Description {
            info,
            camera,
            scene,
        } = description;

        let Some((target, _)) = scene.iter().next() else {
            bail!("an interactive session needs at least one shape")
        };

        Ok(Self {
            scene,
            camera,
            info,
            config,
            target,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Render the scene as it currently stands.
    pub fn render(&self) -> Canvas {
        render(&self.config, &self.info, &self.scene, &self.camera)
    }

    /// Apply `control` to the first shape and its descendants, then render the new frame.
    pub fn apply(&mut self, control: Control) -> Canvas {
        info!("applying {:?}", control);
        match control {
            Control::Translate(offset) => self.scene.translate(self.target, &offset),
            Control::Rotate(degrees) => self.scene.rotate(self.target, degrees, &Vector3::y_axis()),
        }
        self.render()
    }
}
