//! Content panel opened by interactive cubes.
//!
//! A click opens content right away; a projectile hit opens it shortly after
//! the burst.  Both go through [`ContentQueue`], which releases due payloads
//! as [`ContentRequest`] messages.  Only one panel is ever open: a new request
//! replaces the current one, and `Esc` or the close button clears it.
//!
//! Link records never get a panel; their target is handed to the system
//! browser through an [`OpenLink`] message.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ ▌ NAME                         [ × ] │
//! │ ▌ PHOTO                              │
//! │ ▌ assets/photos/nebula.png           │
//! │ ▌ ESC to close                       │
//! └──────────────────────────────────────┘
//! ```

use bevy::prelude::*;

use crate::config::GalleryConfig;
use crate::particle_source::{ContentKind, ParticleId, ParticleRecord};

// ── Payload & queue ───────────────────────────────────────────────────────────

/// What the panel shows for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentPayload {
    pub particle: ParticleId,
    pub name: String,
    pub kind: Option<ContentKind>,
    pub src: Option<String>,
    pub color: Color,
}

impl ContentPayload {
    pub fn from_record(record: &ParticleRecord, color: Color) -> Self {
        Self {
            particle: record.id,
            name: record.label().to_string(),
            kind: record.kind,
            src: record.src.clone(),
            color,
        }
    }

    /// Upper-case heading for the kind line.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            Some(ContentKind::Html) => "ARTICLE",
            Some(ContentKind::Photo) => "PHOTO",
            Some(ContentKind::Link) => "LINK",
            None => "",
        }
    }

    /// Browser target for link records with a non-empty `src`.
    pub fn link_target(&self) -> Option<&str> {
        match (self.kind, self.src.as_deref()) {
            (Some(ContentKind::Link), Some(src)) if !src.trim().is_empty() => Some(src),
            _ => None,
        }
    }

    /// Body text: markup source or image path.
    pub fn body(&self) -> String {
        match self.src.as_deref() {
            Some(src) if !src.trim().is_empty() => src.to_string(),
            _ => "(no content)".to_string(),
        }
    }
}

/// Payloads waiting for their release time.
#[derive(Resource, Debug, Default)]
pub struct ContentQueue {
    pending: Vec<(f32, ContentPayload)>,
}

impl ContentQueue {
    /// Queue `payload` for release at scene time `at`.
    pub fn schedule(&mut self, payload: ContentPayload, at: f32) {
        self.pending.push((at, payload));
    }

    /// Drop everything queued (scene reload).
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every payload due at `now`, earliest first.
    /// Ties keep their scheduling order.
    pub fn take_due(&mut self, now: f32) -> Vec<ContentPayload> {
        let mut due: Vec<(f32, ContentPayload)> = Vec::new();
        let mut waiting = Vec::with_capacity(self.pending.len());
        for entry in self.pending.drain(..) {
            if entry.0 <= now {
                due.push(entry);
            } else {
                waiting.push(entry);
            }
        }
        self.pending = waiting;
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().map(|(_, payload)| payload).collect()
    }
}

/// Open the panel with this payload.
#[derive(Message, Debug, Clone)]
pub struct ContentRequest(pub ContentPayload);

/// Open a URL in the system browser.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct OpenLink(pub String);

/// The payload currently on screen, if any.
#[derive(Resource, Debug, Default, Clone)]
pub struct ActiveContent(pub Option<ContentPayload>);

impl ActiveContent {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.0.is_some()
    }
}

// ── UI markers ────────────────────────────────────────────────────────────────

/// Root node of the content panel; despawned on close or replace.
#[derive(Component)]
pub struct ContentPanelRoot;

/// Tags the panel's close button.
#[derive(Component)]
pub struct ContentCloseButton;

// ── Systems ───────────────────────────────────────────────────────────────────

/// Release queued payloads whose time has come.
pub fn release_due_content_system(
    time: Res<Time>,
    mut queue: ResMut<ContentQueue>,
    mut requests: MessageWriter<ContentRequest>,
) {
    if queue.is_empty() {
        return;
    }
    for payload in queue.take_due(time.elapsed_secs()) {
        requests.write(ContentRequest(payload));
    }
}

/// Links go to the browser; for everything else the latest request wins the
/// panel.
pub fn open_content_system(
    mut requests: MessageReader<ContentRequest>,
    mut active: ResMut<ActiveContent>,
    mut links: MessageWriter<OpenLink>,
) {
    let mut panel = None;
    for ContentRequest(payload) in requests.read() {
        match payload.link_target() {
            Some(url) => {
                links.write(OpenLink(url.to_string()));
            }
            None => panel = Some(payload),
        }
    }
    if let Some(payload) = panel {
        info!("opening content for '{}'", payload.name);
        active.0 = Some(payload.clone());
    }
}

/// Hand link targets to the system browser.
pub fn launch_links_system(mut links: MessageReader<OpenLink>) {
    for OpenLink(url) in links.read() {
        info!("opening link {url}");
        if let Err(e) = webbrowser::open(url) {
            warn!("could not open {url}: {e}");
        }
    }
}

/// `Esc` closes the panel.
pub fn close_content_on_escape(keys: Res<ButtonInput<KeyCode>>, mut active: ResMut<ActiveContent>) {
    if keys.just_pressed(KeyCode::Escape) && active.is_open() {
        active.0 = None;
    }
}

/// Close button on the panel.
pub fn content_close_button_system(
    query: Query<&Interaction, (Changed<Interaction>, With<ContentCloseButton>)>,
    mut active: ResMut<ActiveContent>,
) {
    if query.iter().any(|i| *i == Interaction::Pressed) {
        active.0 = None;
    }
}

/// Rebuild the panel whenever [`ActiveContent`] changes.
pub fn sync_content_panel_system(
    mut commands: Commands,
    active: Res<ActiveContent>,
    config: Res<GalleryConfig>,
    panels: Query<Entity, With<ContentPanelRoot>>,
) {
    if !active.is_changed() {
        return;
    }
    for entity in panels.iter() {
        commands.entity(entity).despawn();
    }
    let Some(payload) = active.0.as_ref() else {
        return;
    };
    spawn_content_panel(&mut commands, payload, config.hud_font_size);
}

fn spawn_content_panel(commands: &mut Commands, payload: &ContentPayload, font_size: f32) {
    let text_color = Color::srgb(0.85, 0.88, 0.95);
    let hint_color = Color::srgb(0.45, 0.48, 0.58);

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(32.0),
                top: Val::Px(32.0),
                width: Val::Px(380.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(20.0)),
                row_gap: Val::Px(10.0),
                border: UiRect::left(Val::Px(4.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.03, 0.03, 0.06, 0.92)),
            BorderColor::all(payload.color),
            ZIndex(200),
            ContentPanelRoot,
        ))
        .with_children(|card| {
            // Header row: name + close button
            card.spawn(Node {
                flex_direction: FlexDirection::Row,
                justify_content: JustifyContent::SpaceBetween,
                align_items: AlignItems::Center,
                ..default()
            })
            .with_children(|row| {
                row.spawn((
                    Text::new(payload.name.to_uppercase()),
                    TextFont {
                        font_size: font_size * 1.6,
                        ..default()
                    },
                    TextColor(payload.color),
                ));
                row.spawn((
                    Button,
                    Node {
                        width: Val::Px(28.0),
                        height: Val::Px(28.0),
                        justify_content: JustifyContent::Center,
                        align_items: AlignItems::Center,
                        border: UiRect::all(Val::Px(1.0)),
                        ..default()
                    },
                    BorderColor::all(hint_color),
                    ContentCloseButton,
                ))
                .with_children(|btn| {
                    btn.spawn((
                        Text::new("x"),
                        TextFont {
                            font_size,
                            ..default()
                        },
                        TextColor(text_color),
                    ));
                });
            });

            card.spawn((
                Text::new(payload.kind_label()),
                TextFont {
                    font_size: font_size * 0.85,
                    ..default()
                },
                TextColor(hint_color),
            ));
            card.spawn((
                Text::new(payload.body()),
                TextFont {
                    font_size,
                    ..default()
                },
                TextColor(text_color),
            ));
            card.spawn((
                Text::new("ESC to close"),
                TextFont {
                    font_size: font_size * 0.8,
                    ..default()
                },
                TextColor(hint_color),
            ));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(id: u64) -> ContentPayload {
        ContentPayload {
            particle: ParticleId(id),
            name: format!("p{id}"),
            kind: Some(ContentKind::Photo),
            src: Some(format!("photos/{id}.png")),
            color: Color::WHITE,
        }
    }

    #[test]
    fn queue_releases_only_due_payloads_in_time_order() {
        let mut q = ContentQueue::default();
        q.schedule(payload(1), 2.0);
        q.schedule(payload(2), 0.5);
        q.schedule(payload(3), 5.0);

        assert!(q.take_due(0.4).is_empty());
        let due: Vec<u64> = q.take_due(2.0).iter().map(|p| p.particle.0).collect();
        assert_eq!(due, vec![2, 1]);
        assert_eq!(q.len(), 1);

        q.clear();
        assert!(q.take_due(100.0).is_empty());
    }

    #[test]
    fn payload_body_depends_on_kind() {
        let photo = payload(1);
        assert_eq!(photo.body(), "photos/1.png");
        assert_eq!(photo.link_target(), None);

        let link = ContentPayload {
            kind: Some(ContentKind::Link),
            src: Some("https://example.org".into()),
            ..payload(1)
        };
        assert_eq!(link.link_target(), Some("https://example.org"));
        assert_eq!(link.kind_label(), "LINK");

        let blank_link = ContentPayload {
            src: Some("  ".into()),
            ..link.clone()
        };
        assert_eq!(blank_link.link_target(), None);

        let empty = ContentPayload {
            src: None,
            ..payload(2)
        };
        assert_eq!(empty.body(), "(no content)");
    }

    fn content_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<ContentRequest>();
        app.add_message::<OpenLink>();
        app.init_resource::<OpenedLinks>();
        app.init_resource::<ContentQueue>();
        app.init_resource::<ActiveContent>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.add_systems(
            Update,
            (
                release_due_content_system,
                open_content_system,
                close_content_on_escape,
                record_links,
            )
                .chain(),
        );
        app
    }

    #[derive(Resource, Default)]
    struct OpenedLinks(Vec<String>);

    fn record_links(mut links: MessageReader<OpenLink>, mut opened: ResMut<OpenedLinks>) {
        opened.0.extend(links.read().map(|link| link.0.clone()));
    }

    #[test]
    fn link_requests_go_to_the_browser_not_the_panel() {
        let mut app = content_app();
        app.world_mut().resource_mut::<ContentQueue>().schedule(
            ContentPayload {
                kind: Some(ContentKind::Link),
                src: Some("https://example.org".into()),
                ..payload(7)
            },
            0.0,
        );
        app.update();

        assert!(!app.world().resource::<ActiveContent>().is_open());
        assert_eq!(
            app.world().resource::<OpenedLinks>().0,
            vec!["https://example.org".to_string()]
        );
    }

    #[test]
    fn link_released_alongside_a_panel_leaves_the_panel_open() {
        let mut app = content_app();
        {
            let mut q = app.world_mut().resource_mut::<ContentQueue>();
            q.schedule(payload(1), 0.0);
            q.schedule(
                ContentPayload {
                    kind: Some(ContentKind::Link),
                    src: Some("mailto:hello@example.com".into()),
                    ..payload(2)
                },
                0.0,
            );
        }
        app.update();

        let active = app.world().resource::<ActiveContent>();
        assert_eq!(active.0.as_ref().map(|p| p.particle), Some(ParticleId(1)));
        assert_eq!(app.world().resource::<OpenedLinks>().0.len(), 1);
    }

    #[test]
    fn newer_request_replaces_the_open_panel_and_escape_closes_it() {
        let mut app = content_app();
        {
            let mut q = app.world_mut().resource_mut::<ContentQueue>();
            q.schedule(payload(1), 0.0);
            q.schedule(payload(2), 0.0);
        }
        app.update();
        let active = app.world().resource::<ActiveContent>();
        assert_eq!(active.0.as_ref().map(|p| p.particle), Some(ParticleId(2)));

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Escape);
        app.update();
        assert!(!app.world().resource::<ActiveContent>().is_open());
    }
}
