//! The workspace switcher overlay: a row of boxes, one per workspace with
//! the current one filled, above the current workspace's name. Each usable
//! output gets its own centered copy.

use tracing::{debug, error, instrument};

use crate::common::collections::HashMap;
use crate::common::config::OsdTheme;
use crate::model::workspace::WorkspaceRegistry;
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::scene::{DrawOp, NodeId, Scene};
use crate::sys::screen::{OutputId, Outputs};

const MARGIN: u32 = 10;
const PADDING: u32 = 2;
const BOX_WIDTH: u32 = 20;
const BOX_HEIGHT: u32 = 20;
const MIN_MARKER_WIDTH: u32 = 200;

pub trait TextMeasure {
    fn width(&self, text: &str, font_size: f64) -> u32;

    fn line_height(&self, font_size: f64) -> u32;
}

/// Every glyph gets the same advance. Good enough where no font machinery
/// is available.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    pub advance: f64,
    pub line_height: f64,
}

impl Default for FixedAdvance {
    fn default() -> Self { Self { advance: 0.6, line_height: 1.2 } }
}

impl TextMeasure for FixedAdvance {
    fn width(&self, text: &str, font_size: f64) -> u32 {
        (text.chars().count() as f64 * font_size * self.advance).round() as u32
    }

    fn line_height(&self, font_size: f64) -> u32 { (font_size * self.line_height).round() as u32 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsdLayout {
    pub count: u32,
    pub marker_width: u32,
    pub width: u32,
    pub height: u32,
}

impl OsdLayout {
    pub fn new(count: usize, text_height: u32) -> Self {
        let count = count as u32;
        let marker_width = (count * (BOX_WIDTH + PADDING)).saturating_sub(PADDING);
        Self {
            count,
            marker_width,
            width: 2 * MARGIN + marker_width.max(MIN_MARKER_WIDTH),
            height: 3 * MARGIN + BOX_HEIGHT + text_height,
        }
    }

    pub fn size(&self) -> Size { Size::new(self.width, self.height) }

    /// Outline of the `i`th workspace box.
    pub fn marker(&self, i: u32) -> Rect {
        let start = (self.width - self.marker_width) / 2;
        Rect::new(
            (start + i * (BOX_WIDTH + PADDING)) as i32,
            MARGIN as i32,
            (BOX_WIDTH - PADDING) as i32,
            BOX_HEIGHT as i32,
        )
    }

    pub fn label_max_width(&self) -> u32 { self.width - 2 * MARGIN }

    pub fn label_origin(&self, text_width: u32) -> Point {
        let text_width = text_width.min(self.label_max_width());
        Point::new(((self.width - text_width) / 2) as i32, (2 * MARGIN + BOX_HEIGHT) as i32)
    }
}

pub struct WorkspaceOsd {
    theme: OsdTheme,
    measure: Box<dyn TextMeasure>,
    nodes: HashMap<OutputId, NodeId>,
}

impl WorkspaceOsd {
    pub fn new(theme: OsdTheme) -> Self { Self::with_measure(theme, FixedAdvance::default()) }

    pub fn with_measure(theme: OsdTheme, measure: impl TextMeasure + 'static) -> Self {
        Self {
            theme,
            measure: Box::new(measure),
            nodes: HashMap::default(),
        }
    }

    pub fn layout(&self, registry: &WorkspaceRegistry) -> OsdLayout {
        OsdLayout::new(registry.len(), self.measure.line_height(self.theme.font_size))
    }

    pub fn draw(&self, registry: &WorkspaceRegistry) -> (OsdLayout, Vec<DrawOp>) {
        let layout = self.layout(registry);
        let theme = &self.theme;
        let mut ops = vec![
            DrawOp::FillRect {
                rect: Rect::new(0, 0, layout.width as i32, layout.height as i32),
                color: theme.bg_color,
            },
            DrawOp::Border {
                width: theme.border_width,
                color: theme.border_color,
            },
        ];
        for (i, (id, _)) in registry.all().enumerate() {
            let rect = layout.marker(i as u32);
            ops.push(DrawOp::StrokeRect { rect, color: theme.label_text_color });
            if registry.is_active(id) {
                ops.push(DrawOp::FillRect { rect, color: theme.label_text_color });
            }
        }
        let label = registry.name(registry.current());
        let text_width = self.measure.width(label, theme.font_size);
        ops.push(DrawOp::Text {
            origin: layout.label_origin(text_width),
            max_width: layout.label_max_width(),
            font_size: theme.font_size,
            color: theme.label_text_color,
            text: label.to_owned(),
        });
        (layout, ops)
    }

    /// Renders fresh content for every usable output and enables it there.
    /// Outputs whose buffer can't be allocated are skipped. Returns how many
    /// outputs now show the OSD.
    #[instrument(skip_all)]
    pub fn show(
        &mut self,
        registry: &WorkspaceRegistry,
        scene: &mut dyn Scene,
        outputs: &dyn Outputs,
    ) -> usize {
        let (layout, ops) = self.draw(registry);
        let size = layout.size();
        let mut shown = 0;
        for output in outputs.usable() {
            let buffer = match scene.render_buffer(size, output.scale, &ops) {
                Ok(buffer) => buffer,
                Err(err) => {
                    error!(output = output.id.as_u32(), %err, "Failed to allocate buffer for workspace OSD");
                    if let Some(&node) = self.nodes.get(&output.id) {
                        scene.set_enabled(node, false);
                        scene.set_buffer(node, None, Size::default());
                    }
                    continue;
                }
            };
            let root = scene.root();
            let node = *self
                .nodes
                .entry(output.id)
                .or_insert_with(|| scene.create_buffer_node(root));
            scene.set_position(node, output.centered(size));
            scene.set_buffer(node, Some(buffer), size);
            scene.set_enabled(node, true);
            shown += 1;
        }
        debug!(shown, ?size, "workspace osd shown");
        shown
    }

    /// Disables the OSD everywhere and releases its buffers. Nodes are kept
    /// for the next show.
    pub fn hide(&mut self, scene: &mut dyn Scene) {
        for &node in self.nodes.values() {
            scene.set_enabled(node, false);
            scene.set_buffer(node, None, Size::default());
        }
    }

    pub fn node(&self, output: OutputId) -> Option<NodeId> { self.nodes.get(&output).copied() }

    pub fn teardown(&mut self, scene: &mut dyn Scene) {
        for (_, node) in self.nodes.drain() {
            scene.destroy_node(node);
        }
    }
}
