//! System directive that opens every session

/// Build the game-master directive for a genre.
///
/// The genre is embedded verbatim.
pub fn build_system_directive(genre: &str) -> String {
    format!(
        "You are a creative, consistent game master running a {genre} role-playing adventure. \
         First, ask the player any clarifying questions to establish setting, characters, \
         and rules. Then begin narrating the story: describe scenes, present choices, and \
         respond to actions. Keep track of details and maintain continuity. Be imaginative \
         and adventurous."
    )
}
