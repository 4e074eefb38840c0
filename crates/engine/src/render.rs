//! Shared button labels, keyboards, and build rendering.

use std::collections::HashMap;

use armory_domain::Build;
use armory_shared::Keyboard;

// Button labels double as entry triggers; the dispatcher matches on them.
pub const BTN_BROWSE: &str = "Warzone builds";
pub const BTN_ADD: &str = "Add build";
pub const BTN_HOME: &str = "Main menu";
pub const BTN_NEXT: &str = "Next";
pub const BTN_PREV: &str = "Previous";
pub const BTN_CONFIRM: &str = "Confirm";
pub const BTN_CANCEL: &str = "Cancel";
pub const BTN_YES: &str = "Yes";
pub const BTN_ADD_ANOTHER: &str = "Add another build";

/// The entry menu. Admins also get the add-build row.
pub fn main_menu(is_admin: bool) -> Keyboard {
    let mut kb = Keyboard::single_column([BTN_BROWSE]);
    if is_admin {
        kb = kb.with_row(BTN_ADD);
    }
    kb
}

/// Append the home row so every keyboard offers a way back.
pub fn with_home(kb: Keyboard) -> Keyboard {
    if kb.rows.iter().any(|row| row.iter().any(|b| b == BTN_HOME)) {
        return kb;
    }
    kb.with_row(BTN_HOME)
}

/// Caption for one build, with module codes translated to labels.
///
/// `translation` maps variant codes to display labels; untranslated codes
/// fall back to the raw code.
pub fn build_caption(
    build: &Build,
    type_label: &str,
    translation: &HashMap<String, String>,
) -> String {
    let modules_text = build
        .modules
        .iter()
        .map(|(slot, code)| {
            let label = translation.get(code).map(String::as_str).unwrap_or(code);
            format!("├ {slot}: {label}")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Weapon: {}\nRange: {}\nType: {}\n\nModules: {}\n{}\n\nAuthor: {}",
        build.weapon_name,
        dash_if_empty(&build.role),
        type_label,
        build.module_count(),
        modules_text,
        build.author,
    )
}

/// One line-block per build for the plain-text listings (`show_all`, the
/// delete list).
pub fn build_summary(index: usize, build: &Build) -> String {
    format!(
        "{index}. {}\n├ Range: {}\n├ Type: {}\n├ Modules: {}\n└ Author: {}",
        build.weapon_name.to_uppercase(),
        dash_if_empty(&build.role),
        build.weapon_type,
        build.module_count(),
        build.author,
    )
}

fn dash_if_empty(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use armory_domain::{Category, Mode};

    fn sample() -> Build {
        let modules: BTreeMap<String, String> = [
            ("Barrel".to_string(), "long-barrel".to_string()),
            ("Muzzle".to_string(), "mystery-code".to_string()),
            ("Optic".to_string(), "red-dot".to_string()),
            ("Stock".to_string(), "no-stock".to_string()),
            ("Laser".to_string(), "tac-laser".to_string()),
        ]
        .into_iter()
        .collect();
        Build::new(
            "M4A1",
            "",
            Category::Meta,
            Mode::Warzone,
            "assault",
            modules,
            "images/x.jpg",
            "Tester",
        )
        .expect("valid build")
    }

    #[test]
    fn caption_translates_and_falls_back() {
        let translation: HashMap<String, String> =
            [("red-dot".to_string(), "Red dot".to_string())].into_iter().collect();
        let caption = build_caption(&sample(), "Assault rifles", &translation);

        assert!(caption.contains("├ Optic: Red dot"));
        // Untranslated codes render raw.
        assert!(caption.contains("├ Muzzle: mystery-code"));
        assert!(caption.contains("Range: -"));
        assert!(caption.contains("Modules: 5"));
    }

    #[test]
    fn main_menu_gates_admin_row() {
        assert_eq!(main_menu(false).rows.len(), 1);
        assert_eq!(main_menu(true).rows.len(), 2);
    }

    #[test]
    fn with_home_is_idempotent() {
        let kb = with_home(with_home(Keyboard::single_column(["a"])));
        let home_rows = kb
            .rows
            .iter()
            .filter(|row| row.iter().any(|b| b == BTN_HOME))
            .count();
        assert_eq!(home_rows, 1);
    }
}
