//! Server-rendered HTML.
//!
//! Pages are plain strings; anything that came from a user goes through
//! [`escape`].

use power4::{Cell, GameSnapshot, Gravity};

use super::middleware::CurrentUser;

/// Escape text for use in HTML element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/assets/style.css">
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
    )
}

fn cell_class(cell: Cell) -> &'static str {
    match cell {
        Cell::Empty => "cell empty",
        Cell::PlayerOne => "cell p1",
        Cell::PlayerTwo => "cell p2",
    }
}

/// Board page of a game
pub fn board_page(game: &GameSnapshot, user: &CurrentUser, notice: Option<&str>) -> String {
    let mut body = String::from("<header>\n<h1>Power4</h1>\n");
    match user {
        CurrentUser::User(name) => body.push_str(&format!(
            r#"<p class="user">Signed in as <strong>{}</strong></p>
<form method="post" action="/logout"><button type="submit">Log out</button></form>
"#,
            escape(name)
        )),
        CurrentUser::Guest => body.push_str(
            r#"<p class="user">Playing as guest. <a href="/login">Log in</a></p>
"#,
        ),
    }
    body.push_str("</header>\n");

    body.push_str(&status_section(game, notice));
    body.push_str(&board_table(game));
    body.push_str(
        r#"<form method="post" action="/reset"><button type="submit">New game</button></form>
"#,
    );

    layout("Power4", &body)
}

fn gravity_arrow(gravity: Gravity) -> &'static str {
    match gravity {
        Gravity::Down => "&darr;",
        Gravity::Up => "&uarr;",
    }
}

fn status_section(game: &GameSnapshot, notice: Option<&str>) -> String {
    let mut section = String::from("<section class=\"status\">\n");
    if let Some(notice) = notice {
        section.push_str(&format!("<p class=\"notice\">{}</p>\n", escape(notice)));
    }
    if !game.message.is_empty() {
        section.push_str(&format!("<p class=\"message\">{}</p>\n", escape(&game.message)));
    }
    if !game.finished {
        section.push_str(&format!(
            "<p class=\"turn p{}\">{} to move</p>\n",
            game.current_player.number(),
            game.current_player,
        ));
    }

    let countdown = match (game.finished, game.moves_until_flip) {
        (false, Some(1)) => " (inverts in 1 move)".to_string(),
        (false, Some(moves)) => format!(" (inverts in {moves} moves)"),
        _ => String::new(),
    };
    section.push_str(&format!(
        "<p class=\"gravity\">Gravity: {} {}{countdown}</p>\n</section>\n",
        gravity_arrow(game.gravity),
        game.gravity,
    ));
    section
}

/// Drop buttons over the grid, one per column
fn board_table(game: &GameSnapshot) -> String {
    let arrow = gravity_arrow(game.gravity);
    let drops: String = (0..game.cols)
        .map(|col| {
            let disabled = if game.is_column_open(col) { "" } else { " disabled" };
            format!(
                r#"<th><form method="post" action="/play"><input type="hidden" name="col" value="{col}"><button type="submit"{disabled}>{arrow}</button></form></th>
"#
            )
        })
        .collect();
    let rows: String = game
        .board
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|&cell| format!(r#"<td class="{}"></td>"#, cell_class(cell)))
                .collect();
            format!("<tr>{cells}</tr>\n")
        })
        .collect();

    format!(
        "<table class=\"board gravity-{}\">\n<tr class=\"drops\">\n{drops}</tr>\n{rows}</table>\n",
        game.gravity
    )
}

fn credentials_form(action: &str, submit: &str, error: Option<&str>, footer: &str) -> String {
    let notice = error
        .map(|error| format!("<p class=\"notice\">{}</p>\n", escape(error)))
        .unwrap_or_default();
    format!(
        r#"<h1>Power4</h1>
{notice}<form method="post" action="{action}" class="credentials">
<label>Username <input type="text" name="username" required minlength="3" maxlength="20"></label>
<label>Password <input type="password" name="password" required minlength="4"></label>
<button type="submit">{submit}</button>
</form>
<p>{footer}</p>
"#
    )
}

/// Login page, optionally showing why the last attempt failed
pub fn login_page(error: Option<&str>) -> String {
    let body = credentials_form(
        "/login",
        "Log in",
        error,
        r#"No account yet? <a href="/register">Register</a>"#,
    );
    layout("Power4 - Log in", &body)
}

/// Registration page, optionally showing why the last attempt failed
pub fn register_page(error: Option<&str>) -> String {
    let body = credentials_form(
        "/register",
        "Register",
        error,
        r#"Already registered? <a href="/login">Log in</a>"#,
    );
    layout("Power4 - Register", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use power4::GameState;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
        assert_eq!(escape("plain_name"), "plain_name");
    }

    #[test]
    fn test_board_page_has_a_button_per_column() {
        let page = board_page(&GameState::new().snapshot(), &CurrentUser::Guest, None);
        assert_eq!(page.matches(r#"name="col""#).count(), 7);
        assert_eq!(page.matches("cell empty").count(), 42);
        assert!(page.contains("Player 1 to move"));
        assert!(page.contains("inverts in 5 moves"));
    }

    #[test]
    fn test_board_page_escapes_user_text() {
        let user = CurrentUser::User("<b>mallory</b>".to_string());
        let page = board_page(&GameState::new().snapshot(), &user, Some("<i>oops</i>"));
        assert!(!page.contains("<b>mallory</b>"));
        assert!(page.contains("&lt;b&gt;mallory&lt;/b&gt;"));
        assert!(page.contains("&lt;i&gt;oops&lt;/i&gt;"));
    }

    #[test]
    fn test_finished_board_disables_drops() {
        let mut game = GameState::with_config(power4::GameConfig::classic()).unwrap();
        for col in [0, 1, 0, 1, 0, 1, 0] {
            game.play(col).unwrap();
        }
        let page = board_page(&game.snapshot(), &CurrentUser::Guest, None);
        assert_eq!(page.matches(" disabled>").count(), 7);
        assert!(page.contains("Player 1 wins!"));
        assert!(!page.contains("to move"));
    }

    #[test]
    fn test_gravity_countdown_wording() {
        let mut game = GameState::new();
        for col in [0, 1, 2, 3] {
            game.play(col).unwrap();
        }
        let page = board_page(&game.snapshot(), &CurrentUser::Guest, None);
        assert!(page.contains("Gravity: &darr; down (inverts in 1 move)</p>"));

        let classic = GameState::with_config(power4::GameConfig::classic()).unwrap();
        let page = board_page(&classic.snapshot(), &CurrentUser::Guest, None);
        assert!(!page.contains("inverts in"));
    }

    #[test]
    fn test_credential_pages() {
        assert!(login_page(None).contains(r#"action="/login""#));
        assert!(register_page(Some("Username already exists")).contains("Username already exists"));
    }
}
