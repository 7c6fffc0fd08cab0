use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::geometry::{Point, Rect, Size};

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutputId(u32);

impl OutputId {
    pub fn new(id: u32) -> Self { OutputId(id) }

    pub fn as_u32(&self) -> u32 { self.0 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub id: OutputId,
    pub name: Option<String>,
    /// Position and size of the output in the global layout.
    pub layout: Rect,
    /// Area not reserved by panels, relative to the output's own origin.
    pub usable_area: Rect,
    pub scale: f64,
    pub enabled: bool,
}

impl OutputDescriptor {
    pub fn new(id: OutputId, layout: Rect, scale: f64) -> Self {
        Self {
            id,
            name: None,
            layout,
            usable_area: Rect::new(0, 0, layout.width, layout.height),
            scale,
            enabled: true,
        }
    }

    pub fn is_usable(&self) -> bool { self.enabled && self.scale > 0.0 }

    /// Layout coordinates that center a `size` box in the usable area.
    pub fn centered(&self, size: Size) -> Point {
        let local = self.usable_area.center_box(size);
        Point::new(local.x + self.layout.x, local.y + self.layout.y)
    }
}

/// The output subsystem as seen by the workspace core.
pub trait Outputs {
    fn outputs(&self) -> Vec<OutputDescriptor>;

    fn usable(&self) -> Vec<OutputDescriptor> {
        self.outputs().into_iter().filter(OutputDescriptor::is_usable).collect()
    }
}

/// A fixed set of outputs, shared between the session and whoever drives it.
#[derive(Debug, Clone, Default)]
pub struct StaticOutputs(Rc<RefCell<Vec<OutputDescriptor>>>);

impl StaticOutputs {
    pub fn new(outputs: Vec<OutputDescriptor>) -> Self { Self(Rc::new(RefCell::new(outputs))) }

    pub fn set_enabled(&self, id: OutputId, enabled: bool) {
        if let Some(output) = self.0.borrow_mut().iter_mut().find(|o| o.id == id) {
            debug!(?id, enabled, "output enabled state changed");
            output.enabled = enabled;
        }
    }
}

impl Outputs for StaticOutputs {
    fn outputs(&self) -> Vec<OutputDescriptor> { self.0.borrow().clone() }
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid output spec {0:?}, expected WIDTHxHEIGHT[+X+Y][@SCALE]")]
pub struct ParseOutputError(String);

/// Output geometry as written on the command line, `1920x1080+1920+0@2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSpec {
    pub layout: Rect,
    pub scale: f64,
}

impl FromStr for OutputSpec {
    type Err = ParseOutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseOutputError(s.to_string());
        let (geometry, scale) = match s.split_once('@') {
            Some((g, scale)) => (g, scale.parse::<f64>().map_err(|_| err())?),
            None => (s, 1.0),
        };
        if !(scale > 0.0) {
            return Err(err());
        }
        let mut parts = geometry.split('+');
        let size = parts.next().ok_or_else(err)?;
        let (w, h) = size.split_once('x').ok_or_else(err)?;
        let width: i32 = w.parse().map_err(|_| err())?;
        let height: i32 = h.parse().map_err(|_| err())?;
        let x: i32 = parts.next().map(str::parse::<i32>).transpose().map_err(|_| err())?.unwrap_or(0);
        let y: i32 = parts.next().map(str::parse::<i32>).transpose().map_err(|_| err())?.unwrap_or(0);
        if parts.next().is_some() || width <= 0 || height <= 0 {
            return Err(err());
        }
        Ok(OutputSpec {
            layout: Rect::new(x, y, width, height),
            scale,
        })
    }
}

impl OutputSpec {
    pub fn into_descriptor(self, id: OutputId) -> OutputDescriptor {
        OutputDescriptor::new(id, self.layout, self.scale)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_output_specs() {
        assert_eq!(
            "1920x1080".parse::<OutputSpec>(),
            Ok(OutputSpec {
                layout: Rect::new(0, 0, 1920, 1080),
                scale: 1.0
            })
        );
        assert_eq!(
            "2560x1440+1920+0@1.5".parse::<OutputSpec>(),
            Ok(OutputSpec {
                layout: Rect::new(1920, 0, 2560, 1440),
                scale: 1.5
            })
        );
        assert!("1920".parse::<OutputSpec>().is_err());
        assert!("1920x1080@0".parse::<OutputSpec>().is_err());
        assert!("1920x1080+1+2+3".parse::<OutputSpec>().is_err());
        assert!("-5x10".parse::<OutputSpec>().is_err());
    }

    #[test]
    fn centers_in_usable_area_with_layout_offset() {
        let mut output = OutputDescriptor::new(OutputId::new(2), Rect::new(1920, 0, 1000, 800), 1.0);
        output.usable_area = Rect::new(0, 40, 1000, 760);
        assert_eq!(output.centered(Size::new(200, 60)), Point::new(1920 + 400, 40 + 350));
    }

    #[test]
    fn disabled_outputs_are_not_usable() {
        let outputs = StaticOutputs::new(vec![
            OutputDescriptor::new(OutputId::new(1), Rect::new(0, 0, 800, 600), 1.0),
            OutputDescriptor::new(OutputId::new(2), Rect::new(800, 0, 800, 600), 1.0),
        ]);
        outputs.set_enabled(OutputId::new(1), false);
        let usable: Vec<_> = outputs.usable().into_iter().map(|o| o.id).collect();
        assert_eq!(usable, vec![OutputId::new(2)]);
        assert_eq!(outputs.outputs().len(), 2);
    }
}
