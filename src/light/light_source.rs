// src/light/light_source.rs

use std::collections::HashMap;

use crate::bsp::Vec3;

pub const DEFAULT_LIGHT_LEVEL: f64 = 300.0;
pub const DEFAULT_SUN_LEVEL: f64 = 30.0;

/// A map entity: class name, origin and string key/value properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub class_name: String,
    pub origin: Vec3,
    pub props: HashMap<String, String>,
}

impl Entity {
    pub fn new(class_name: &str, origin: Vec3) -> Self {
        Entity {
            class_name: class_name.to_string(),
            origin,
            props: HashMap::new(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: impl ToString) -> Self {
        self.props.insert(key.to_string(), value.to_string());
        self
    }

    pub fn matches(&self, class_name: &str) -> bool {
        self.class_name == class_name
    }

    /// Numeric property, or `default` when absent or unparsable.
    pub fn get_double(&self, key: &str, default: f64) -> f64 {
        self.props
            .get(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Point,
    /// Lights everything it can see at full level, wherever it is.
    Sun,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub kind: LightKind,
    pub origin: Vec3,
    pub radius: f64,
    /// 16.8 fixed point.
    pub level: i32,
}

impl LightSource {
    /// Fixed-point light added at `point`, ignoring visibility.
    pub fn contribution(&self, point: Vec3) -> Option<i32> {
        match self.kind {
            LightKind::Sun => Some(self.level),
            LightKind::Point => {
                let dist = point.distance_to(self.origin);
                if dist < self.radius {
                    Some((self.level as f64 * (1.0 - dist / self.radius)) as i32)
                } else {
                    None
                }
            }
        }
    }
}

/// Collects the light-emitting entities.
pub fn find_lights(entities: &[Entity]) -> Vec<LightSource> {
    let mut lights = Vec::new();

    for ent in entities {
        let kind = if ent.matches("light") {
            LightKind::Point
        } else if ent.matches("oblige_sun") {
            LightKind::Sun
        } else {
            continue;
        };

        let default_level = match kind {
            LightKind::Sun => DEFAULT_SUN_LEVEL,
            LightKind::Point => DEFAULT_LIGHT_LEVEL,
        };

        let level = ent.get_double("light", default_level);
        let radius = ent.get_double("_radius", level);

        if level < 1.0 || radius < 1.0 {
            continue;
        }

        lights.push(LightSource {
            kind,
            origin: ent.origin,
            radius,
            level: (level * 256.0) as i32,
        });
    }

    lights
}
