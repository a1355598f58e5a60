//! Telegram UI formatting tests.

use teloxide::types::InlineKeyboardButtonKind;

use telemon::dispatch::Button;
use telemon::telegram::ui::{escape_html, keyboard};

#[test]
fn escape_html_escapes_special_chars() {
    assert_eq!(escape_html("<b>test</b>"), "&lt;b&gt;test&lt;/b&gt;");
    assert_eq!(escape_html("a & b"), "a &amp; b");
}

#[test]
fn escape_html_passes_normal_text() {
    let text = "just a normal message";
    assert_eq!(escape_html(text), text);
}

#[test]
fn keyboard_keeps_rows_and_callbacks() {
    let rows = vec![
        vec![Button {
            label: "rig1".to_owned(),
            data: "sel:info:rig1".to_owned(),
        }],
        vec![
            Button {
                label: "Yes".to_owned(),
                data: "yes:reboot:rig1".to_owned(),
            },
            Button {
                label: "No".to_owned(),
                data: "cancel".to_owned(),
            },
        ],
    ];

    let markup = keyboard(&rows);
    let grid = &markup.inline_keyboard;
    assert_eq!(grid.len(), 2);
    assert_eq!(grid[0].len(), 1);
    assert_eq!(grid[1].len(), 2);

    let yes = &grid[1][0];
    assert_eq!(yes.text, "Yes");
    match &yes.kind {
        InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "yes:reboot:rig1"),
        other => panic!("expected callback data, got {other:?}"),
    }
}
