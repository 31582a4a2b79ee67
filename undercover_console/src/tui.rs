use console::Style;
use itertools::Itertools;
use undercover::player::{PeerId, PlayerInfo, Role};
use undercover::round::Phase;
use undercover::session::{RoundView, SessionView};


fn render_player_list(players: &[PlayerInfo], my_id: &PeerId) -> String {
    players
        .iter()
        .map(|p| {
            let name = if p.id == *my_id {
                Style::new().bold().apply_to(&p.name).to_string()
            } else {
                p.name.clone()
            };
            format!("  • {name}\n")
        })
        .join("")
}

fn render_round(round: &RoundView, my_id: &PeerId) -> String {
    let mut out = String::new();
    let role = match round.my_role {
        Role::Normal => Style::new().green().apply_to("a normal player"),
        Role::Undercover => Style::new().red().bold().apply_to("UNDERCOVER"),
    };
    out += &format!("You are {role}! Your word: {}\n", Style::new().bold().apply_to(&round.my_word));
    if let Some(starter) = &round.starter {
        out += &format!("{starter} starts the discussion.\n");
    }
    out += "\n";
    for p in &round.players {
        let mut line = p.name.clone();
        if p.id == *my_id {
            line = Style::new().bold().apply_to(line).to_string();
        }
        if round.is_eliminated(&p.id) {
            line = Style::new().dim().apply_to(format!("{line} (out)")).to_string();
        } else if round.my_vote.as_ref() == Some(&p.id) {
            line = Style::new().reverse().apply_to(line).to_string();
        }
        out += &format!("  • {line}\n");
    }
    out += "\n";
    match round.phase {
        Phase::Discussion => {
            out += &format!("Discussion: {} left\n", round.timer_string());
        }
        Phase::Voting => {
            if round.can_vote(my_id) {
                out += &format!(
                    "{} Type `vote <name>`.\n",
                    Style::new().yellow().apply_to("Voting!")
                );
            } else if round.is_eliminated(my_id) {
                out += "Voting. You have been eliminated.\n";
            } else {
                out += "Voting. Waiting for the others...\n";
            }
        }
        _ => {}
    }
    out
}

pub fn render_session(view: &SessionView, my_id: &PeerId) -> String {
    match view {
        SessionView::Uninitialized => "Waiting for the host...\n".to_owned(),
        SessionView::Lobby { players } => {
            format!("Players ({}):\n{}", players.len(), render_player_list(players, my_id))
        }
        SessionView::InRound(round) => render_round(round, my_id),
        SessionView::Ended(ended) => format!(
            "{}\n\n{}",
            Style::new().magenta().bold().apply_to(&ended.message),
            render_player_list(&ended.players, my_id)
        ),
    }
}
