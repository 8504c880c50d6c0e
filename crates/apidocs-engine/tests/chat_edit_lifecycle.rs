use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use apidocs_engine::{
    ChatOutcome, EditOperation, EventBus, FileStore, LocalEventBus, NamedDocument, PatchOrigin,
    ProjectContext, ProjectId, ProjectOptions, decode, encode,
};
use pretty_assertions::assert_eq;

const GENERATION: &str = r##"Here is the documentation you asked for:

```json
[
  {"filename": "intro.mdx", "content": "# Petstore API

Manage pets.

## Base URL

https://api.example.com"},
  {"filename": "auth.mdx", "content": "# Authentication

## API keys

### Rotating keys

Rotate every 90 days."}
]
```
"##;

const UPDATE_MESSAGE: &str = "I've updated the intro page.

MDX_UPDATE_START
filename: intro.mdx
content:
# Petstore API

Manage pets and orders.

## Base URL

https://api.example.com/v2

## Rate limits

100 requests per minute.
MDX_UPDATE_END";

#[test]
fn generate_edit_browse_and_restore() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let bus = Arc::new(LocalEventBus::new());
    let project = ProjectId::new("petstore").unwrap();

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    bus.on_change(
        &project,
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let mut ctx = ProjectContext::open(project.clone(), store.clone(), ProjectOptions::default())
        .unwrap()
        .with_events(bus.clone());

    // Model output with raw newlines inside JSON strings
    ctx.ingest_generation(GENERATION).unwrap();
    let outline = ctx.outline();
    assert_eq!(outline.len(), 2);
    assert_eq!(outline[0].title, "Petstore API");
    assert_eq!(outline[1].children[0].children[0].id, "rotating-keys");

    // Chat edit through the marker grammar
    let outcome = ctx.apply_chat_message(UPDATE_MESSAGE).unwrap();
    assert!(matches!(
        outcome,
        ChatOutcome::Applied {
            operation: EditOperation::Update { .. },
            origin: PatchOrigin::Marker,
            ..
        }
    ));
    let sections: Vec<String> = ctx.outline()[0]
        .children
        .iter()
        .map(|c| c.id.clone())
        .collect();
    assert_eq!(sections, vec!["base-url", "rate-limits"]);

    // Another view of the same store sees both versions
    let other_tab =
        ProjectContext::open(project.clone(), store.clone(), ProjectOptions::default()).unwrap();
    assert_eq!(other_tab.history().len(), 2);
    assert_eq!(other_tab.documents(), ctx.documents());

    // Browse back, then make the original generation current again
    let original = ctx.view(1).unwrap();
    assert!(original[0].content.contains("Manage pets."));
    assert_eq!(ctx.history().len(), 2);

    ctx.restore(1).unwrap();
    assert_eq!(ctx.history().len(), 3);
    assert_eq!(ctx.documents(), original);
    assert_eq!(notified.load(Ordering::SeqCst), 3);
}

#[test]
fn encoded_snapshot_matches_wire_format() {
    let files = vec![
        NamedDocument::new("intro.mdx", "Hello"),
        NamedDocument::new("auth.mdx", "Bearer token"),
    ];

    let blob = encode(&files);

    assert_eq!(blob, "# intro.mdx\n\nHello\n\n---\n\n# auth.mdx\n\nBearer token");
    assert_eq!(decode(&blob), files);
}
