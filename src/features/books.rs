//! Book stack: loose dynamic books with their titles printed on the spine

use crate::core::BuildError;
use crate::domain::{BookConfig, ItemConfig};
use crate::rigid_body::{BodyOptions, Shape};
use crate::systems::groups::{Built, EngineContext, GroupInfo, GroupManager, DEFAULT_DEPTH};
use crate::systems::scene::{Attachment, VisualKind};

use super::Feature;

pub const BOOK_LABEL: &str = "book";
const TITLE_FONT_SIZE: f32 = 12.0;
const TITLE_COLOR: u32 = 0xffffff;
const TITLE_PADDING: f32 = 10.0;
/// Titles always draw above their book
const TITLE_DEPTH_OFFSET: i32 = 100;

pub struct Books;

impl Feature for Books {
    fn name(&self) -> &'static str {
        "books"
    }

    fn register_builders(&self, groups: &mut GroupManager) {
        groups.add_object_builder("book", build_book);
    }
}

fn build_book(ctx: &mut EngineContext<'_>, _group: &GroupInfo, item: &ItemConfig) -> Result<Built, BuildError> {
    let config: BookConfig = item.typed()?;
    let position = item.position();
    let depth = item.depth.unwrap_or(DEFAULT_DEPTH);

    let body = ctx.world.create_dynamic_body(
        position,
        Shape::rect(config.width, config.height),
        BodyOptions::labelled(BOOK_LABEL),
    );
    let visual = ctx.scene.add(
        VisualKind::Sprite {
            texture: format!("book{}", config.book_type),
        },
        position,
        depth,
    );
    ctx.scene.attach(visual, Attachment::new(body, true));

    let mut built = Built::with_body(body, visual);
    if !config.title.is_empty() {
        let title = ctx.scene.add(
            VisualKind::Text {
                text: config.title,
                font_size: TITLE_FONT_SIZE,
                color: TITLE_COLOR,
                wrap_width: (config.width - TITLE_PADDING).max(0.0),
            },
            position,
            depth + TITLE_DEPTH_OFFSET,
        );
        ctx.scene.attach(title, Attachment::new(body, true));
        built = built.with_extra_visual(title);
    }
    Ok(built)
}
