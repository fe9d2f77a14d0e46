//! # Parser 测试

use std::time::Duration;

use super::*;
use crate::script::ast::{ChoiceOption, Command, Condition, ScreenPosition};

fn parse_with_warnings(text: &str) -> (ScriptDocument, Vec<ParseWarning>) {
    let mut parser = Parser::new();
    let doc = parser.parse(text);
    (doc, parser.warnings().to_vec())
}

// -------------------------------------------------------------------------
// 声明
// -------------------------------------------------------------------------

#[test]
fn test_character_block() {
    let text = r#"
character chocola {
    display_name: "Chocola";
    name_color: 0xFF69B4;
    voice_tag: "choco_v";
}
"#;
    let (doc, warnings) = parse_with_warnings(text);
    assert!(warnings.is_empty(), "{:?}", warnings);

    let chocola = doc.character("chocola").unwrap();
    assert_eq!(chocola.display_name, "Chocola");
    assert_eq!(chocola.name_color, 0xFF69B4);
    assert_eq!(chocola.voice_tag, "choco_v");
}

#[test]
fn test_character_bad_color_is_skipped() {
    let text = "character vanilla {\n display_name: \"Vanilla\"\n name_color: pink\n}";
    let (doc, warnings) = parse_with_warnings(text);

    // 角色仍然被定义，颜色保持默认
    let vanilla = doc.character("vanilla").unwrap();
    assert_eq!(vanilla.display_name, "Vanilla");
    assert_eq!(vanilla.name_color, 0);
    assert!(matches!(
        warnings.as_slice(),
        [ParseWarning::InvalidLine { line: 3, .. }]
    ));
}

#[test]
fn test_asset_definitions_and_duplicates() {
    let text = r#"
asset bg room = "bg/room.png"
asset sprite chocola = "sprites/chocola.png"
asset bg room = "bg/other.png"
"#;
    let (doc, warnings) = parse_with_warnings(text);

    assert_eq!(doc.assets.len(), 2);
    assert_eq!(doc.resolve("bg", "room"), Some("bg/room.png"));
    assert_eq!(doc.resolve("sprite", "chocola"), Some("sprites/chocola.png"));
    assert_eq!(doc.resolve("bg", "missing"), None);
    assert_eq!(
        warnings,
        vec![ParseWarning::Duplicate {
            line: 4,
            kind: "asset",
            name: "bg/room".to_string()
        }]
    );
}

#[test]
fn test_style_block_keeps_field_order() {
    let text = "style dialog {\n  font_size: 24;\n  color: #FFFFFF;\n  padding: 8\n}";
    let doc = ScriptDocument::parse(text);

    let style = doc.style("dialog").unwrap();
    let keys: Vec<&str> = style.fields.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["font_size", "color", "padding"]);
    assert_eq!(style.get("color"), Some("#FFFFFF"));
}

#[test]
fn test_single_line_style_block() {
    let doc = ScriptDocument::parse("style name_box { align: left; bold: true }");
    let style = doc.style("name_box").unwrap();
    assert_eq!(style.get("align"), Some("left"));
    assert_eq!(style.get("bold"), Some("true"));
}

// -------------------------------------------------------------------------
// 指令
// -------------------------------------------------------------------------

#[test]
fn test_say_forms() {
    let text = r#"
say(chocola, "Good morning, master!")
say("The bell rang.")
say("vanilla", "...Morning.")
say(chocola, "She said "nya" twice")
"#;
    let (doc, warnings) = parse_with_warnings(text);
    assert!(warnings.is_empty(), "{:?}", warnings);

    assert_eq!(
        doc.commands,
        vec![
            Command::Say {
                speaker: Some("chocola".to_string()),
                text: "Good morning, master!".to_string()
            },
            Command::Say {
                speaker: None,
                text: "The bell rang.".to_string()
            },
            Command::Say {
                speaker: Some("vanilla".to_string()),
                text: "...Morning.".to_string()
            },
            Command::Say {
                speaker: Some("chocola".to_string()),
                text: "She said \"nya\" twice".to_string()
            },
        ]
    );
}

#[test]
fn test_say_without_quotes_is_skipped() {
    let (doc, warnings) = parse_with_warnings("say(chocola, hello)");
    assert!(doc.is_empty());
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_show_variants() {
    let text = r#"
show sprite chocola as choco at left
show sprite vanilla as vani at 0.3, 0.75 on overlay
show sprite maple
"#;
    let doc = ScriptDocument::parse(text);

    assert_eq!(
        doc.commands[0],
        Command::Show {
            asset_type: "sprite".to_string(),
            name: "chocola".to_string(),
            id: "choco".to_string(),
            position: ScreenPosition::Left,
            layer: None,
        }
    );
    assert_eq!(
        doc.commands[1],
        Command::Show {
            asset_type: "sprite".to_string(),
            name: "vanilla".to_string(),
            id: "vani".to_string(),
            position: ScreenPosition::Custom { x: 0.3, y: 0.75 },
            layer: Some("overlay".to_string()),
        }
    );
    // 省略 as 时 ID 与素材名相同，位置默认居中
    assert_eq!(
        doc.commands[2],
        Command::Show {
            asset_type: "sprite".to_string(),
            name: "maple".to_string(),
            id: "maple".to_string(),
            position: ScreenPosition::Center,
            layer: None,
        }
    );
}

#[test]
fn test_flow_commands() {
    let text = r#"
set route = 2
if route == 2 jump good_end
jump bad_end
play music theme loop
play sfx bell
pause 500
shake 8 300
hide choco
end
"#;
    let (doc, warnings) = parse_with_warnings(text);
    assert!(warnings.is_empty(), "{:?}", warnings);

    assert_eq!(
        doc.commands,
        vec![
            Command::SetVar {
                name: "route".to_string(),
                value: 2
            },
            Command::If {
                condition: Condition {
                    var: "route".to_string(),
                    value: 2
                },
                label: "good_end".to_string()
            },
            Command::Jump {
                label: "bad_end".to_string()
            },
            Command::PlayAudio {
                asset_type: "music".to_string(),
                name: "theme".to_string(),
                looping: true
            },
            Command::PlayAudio {
                asset_type: "sfx".to_string(),
                name: "bell".to_string(),
                looping: false
            },
            Command::Pause {
                duration: Duration::from_millis(500)
            },
            Command::Shake {
                intensity: 8,
                duration: Duration::from_millis(300)
            },
            Command::Hide {
                id: "choco".to_string()
            },
            Command::End,
        ]
    );
}

#[test]
fn test_labels_point_at_next_command() {
    let text = r#"
label start
say("one")
after_one:
say("two")
label tail
"#;
    let doc = ScriptDocument::parse(text);

    assert_eq!(doc.label_index("start"), Some(0));
    assert_eq!(doc.label_index("after_one"), Some(1));
    // 脚本末尾的标签指向末尾之后
    assert_eq!(doc.label_index("tail"), Some(2));
}

#[test]
fn test_reserved_and_duplicate_labels() {
    let (doc, warnings) = parse_with_warnings("label end\nlabel a\nsay(\"x\")\nlabel a");
    assert_eq!(doc.labels.len(), 1);
    assert_eq!(doc.label_index("a"), Some(0));
    assert!(matches!(warnings[0], ParseWarning::InvalidLine { line: 1, .. }));
    assert!(matches!(
        warnings[1],
        ParseWarning::Duplicate {
            line: 4,
            kind: "label",
            ..
        }
    ));
}

#[test]
fn test_choice_block() {
    let text = r#"
choice "Which one?" {
    "Chocola" -> route_choco
    "Vanilla" -> route_vani if met_vanilla == 1
    "Neither" -> end
}
"#;
    let (doc, warnings) = parse_with_warnings(text);
    assert!(warnings.is_empty(), "{:?}", warnings);

    assert_eq!(
        doc.commands,
        vec![Command::Choice {
            prompt: Some("Which one?".to_string()),
            options: vec![
                ChoiceOption {
                    text: "Chocola".to_string(),
                    target: "route_choco".to_string(),
                    condition: None,
                },
                ChoiceOption {
                    text: "Vanilla".to_string(),
                    target: "route_vani".to_string(),
                    condition: Some(Condition {
                        var: "met_vanilla".to_string(),
                        value: 1
                    }),
                },
                ChoiceOption {
                    text: "Neither".to_string(),
                    target: "end".to_string(),
                    condition: None,
                },
            ],
        }]
    );
    assert_eq!(doc.source_line(0), Some(2));
}

#[test]
fn test_choice_without_options_is_skipped() {
    let (doc, warnings) = parse_with_warnings("choice {\n}\n");
    assert!(doc.is_empty());
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_choice_option_limit() {
    let mut text = String::from("choice {\n");
    for i in 0..8 {
        text.push_str(&format!("\"opt {}\" -> l{}\n", i, i));
    }
    text.push('}');

    let (doc, warnings) = parse_with_warnings(&text);
    match &doc.commands[0] {
        Command::Choice { options, .. } => assert_eq!(options.len(), 6),
        other => panic!("期望 Choice，实际 {:?}", other),
    }
    assert!(matches!(
        warnings.as_slice(),
        [ParseWarning::CapacityReached {
            kind: "choice option",
            limit: 6,
            ..
        }]
    ));
}

// -------------------------------------------------------------------------
// 容错
// -------------------------------------------------------------------------

#[test]
fn test_comments_and_semicolons() {
    let text = r#"
// single line comment
/* block
   say("hidden")
*/
scene bg room;;
say("visible");
"#;
    let (doc, warnings) = parse_with_warnings(text);
    assert!(warnings.is_empty(), "{:?}", warnings);
    assert_eq!(doc.len(), 2);
    assert_eq!(doc.source_line(0), Some(6));
    assert_eq!(doc.source_line(1), Some(7));
}

#[test]
fn test_unknown_lines_are_skipped() {
    let text = "say(\"a\")\nteleport home\nsay(\"b\")";
    let (doc, warnings) = parse_with_warnings(text);
    assert_eq!(doc.len(), 2);
    assert_eq!(
        warnings,
        vec![ParseWarning::UnknownStatement {
            line: 2,
            statement: "teleport home".to_string()
        }]
    );
}

#[test]
fn test_oversized_durations_are_skipped() {
    let (doc, warnings) = parse_with_warnings("say(\"a\")\npause 1e30s\nsay(\"b\")");
    assert_eq!(doc.len(), 2);
    assert!(matches!(
        warnings.as_slice(),
        [ParseWarning::InvalidLine { line: 2, .. }]
    ));

    let (doc, warnings) = parse_with_warnings("shake 5 1e20s\nsay(\"b\")");
    assert_eq!(doc.len(), 1);
    assert!(matches!(doc.commands[0], Command::Say { .. }));
    assert!(matches!(
        warnings.as_slice(),
        [ParseWarning::InvalidLine { line: 1, .. }]
    ));
}

#[test]
fn test_block_brace_on_next_line() {
    let text = r#"
character chocola
{
    display_name: "Chocola";
    name_color: 0xFF69B4;
}
choice "Where?"
{
    "Park" -> park
}
label park
"#;
    let (doc, warnings) = parse_with_warnings(text);
    assert!(warnings.is_empty(), "{:?}", warnings);
    assert_eq!(doc.character("chocola").unwrap().display_name, "Chocola");
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.source_line(0), Some(7));
}

#[test]
fn test_command_capacity_reported_once() {
    let limits = ParseLimits {
        max_commands: 2,
        ..ParseLimits::default()
    };
    let mut parser = Parser::with_limits(limits);
    let doc = parser.parse("say(\"1\")\nsay(\"2\")\nsay(\"3\")\nsay(\"4\")");

    assert_eq!(doc.len(), 2);
    assert_eq!(
        parser.warnings(),
        &[ParseWarning::CapacityReached {
            line: 3,
            kind: "command",
            limit: 2
        }]
    );
}

#[test]
fn test_character_capacity() {
    let limits = ParseLimits {
        max_characters: 1,
        ..ParseLimits::default()
    };
    let mut parser = Parser::with_limits(limits);
    let doc = parser.parse("character a { display_name: \"A\" }\ncharacter b { display_name: \"B\" }");

    assert_eq!(doc.characters.len(), 1);
    assert!(doc.character("b").is_none());
    assert_eq!(parser.warnings().len(), 1);
}

#[test]
fn test_unclosed_block_still_parsed() {
    let (doc, warnings) = parse_with_warnings("character a {\ndisplay_name: \"A\"");
    assert_eq!(doc.character("a").unwrap().display_name, "A");
    assert_eq!(warnings, vec![ParseWarning::UnclosedBlock { line: 1 }]);
}

#[test]
fn test_warnings_reset_between_parses() {
    let mut parser = Parser::new();
    parser.parse("nonsense here");
    assert_eq!(parser.warnings().len(), 1);
    parser.parse("end");
    assert!(parser.warnings().is_empty());
}

#[test]
fn test_empty_script() {
    let (doc, warnings) = parse_with_warnings("\n\n   \n// only comments\n");
    assert!(doc.is_empty());
    assert!(warnings.is_empty());
}

// -------------------------------------------------------------------------
// 快照
// -------------------------------------------------------------------------

#[test]
fn test_prologue_snapshot() {
    let text = r#"
character chocola {
    display_name: "Chocola";
}
asset bg shop = "bg/shop.png"

scene bg shop
say(chocola, "Welcome!")
jump finale
label finale
end
"#;
    let doc = ScriptDocument::parse(text);

    insta::assert_yaml_snapshot!(doc.commands, @r"
    - Scene:
        asset_type: bg
        name: shop
    - Say:
        speaker: chocola
        text: Welcome!
    - Jump:
        label: finale
    - End
    ");
    insta::assert_yaml_snapshot!(doc.labels, @r"
    - name: finale
      index: 3
    ");
}
