//! Announcement text templates
//!
//! Placeholders: `{mentions}`, `{name}`, `{host}`, `{server}`, `{map}`, `{slots}`.

use crate::types::Lobby;

/// Template for the text posted alongside a lobby card
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    template: String,
    mentions: String,
}

impl MessageTemplate {
    pub fn new(template: impl Into<String>, mention_roles: &[String]) -> Self {
        let mentions = mention_roles
            .iter()
            .map(|role| format!("<@&{}>", role))
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            template: template.into(),
            mentions,
        }
    }

    pub fn render(&self, lobby: &Lobby) -> String {
        self.template
            .replace("{mentions}", &self.mentions)
            .replace("{name}", &lobby.name)
            .replace("{host}", &lobby.host)
            .replace("{server}", &lobby.server.to_uppercase())
            .replace("{map}", &lobby.map)
            .replace(
                "{slots}",
                &format!("{}/{}", lobby.slots_taken, lobby.slots_total),
            )
            .trim_end()
            .to_string()
    }
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self::new("**New Game Hosted!**\n{mentions}", &[])
    }
}
