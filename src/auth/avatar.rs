use rand::seq::IndexedRandom;

const BACKGROUNDS: [&str; 6] = ["667eea", "ff6b6b", "4ecdc4", "f7b731", "a55eea", "26de81"];

pub(crate) const DEFAULT_BIO: &str = "New on REENKS 🚀";

pub(crate) fn avatar_url(first_name: &str, last_name: &str) -> String {
    let background = BACKGROUNDS.choose(&mut rand::rng()).unwrap_or(&BACKGROUNDS[0]);
    // ui-avatars splits initials on '+', so each word is encoded on its own
    let name = format!("{first_name} {last_name}")
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+");

    format!("https://ui-avatars.com/api/?name={name}&background={background}&color=fff")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_joins_names_and_picks_a_known_background() {
        let url = avatar_url("Ada", "Love Lace");
        assert!(url.starts_with("https://ui-avatars.com/api/?name=Ada+Love+Lace&background="));
        assert!(BACKGROUNDS.iter().any(|bg| url.contains(bg)));
    }

    #[test]
    fn reserved_characters_stay_inside_the_name() {
        let url = avatar_url("Tom&Jerry", "#1=?");
        assert!(url.starts_with("https://ui-avatars.com/api/?name=Tom%26Jerry+%231%3D%3F&background="));
        assert_eq!(url.matches('&').count(), 2);
        assert!(!url.contains('#'));
    }

    #[test]
    fn non_ascii_names_are_percent_encoded() {
        let url = avatar_url("Мария", "Иванова");
        assert!(url.contains("name=%D0%9C%D0%B0%D1%80%D0%B8%D1%8F+"));
        assert!(url.is_ascii());
    }
}
