//! Built-in catalogue used when no cached library exists

use voxlibre_core::Book;

struct SeedEntry {
    id: &'static str,
    title: &'static str,
    author: &'static str,
    description: &'static str,
    cover_seed: &'static str,
    category: &'static str,
    duration: &'static str,
    rating: f32,
}

const SEED: [SeedEntry; 4] = [
    SeedEntry {
        id: "1",
        title: "The Midnight Library",
        author: "Matt Haig",
        description: "Between life and death there is a library, and within that library, the shelves go on forever.",
        cover_seed: "midnight",
        category: "Fiction",
        duration: "9h 12m",
        rating: 4.8,
    },
    SeedEntry {
        id: "2",
        title: "Project Hail Mary",
        author: "Andy Weir",
        description: "A lone astronaut must save the earth from disaster.",
        cover_seed: "hailmary",
        category: "Sci-Fi",
        duration: "12h 30m",
        rating: 4.9,
    },
    SeedEntry {
        id: "3",
        title: "Atomic Habits",
        author: "James Clear",
        description: "An easy & proven way to build good habits & break bad ones.",
        cover_seed: "habits",
        category: "Self-Help",
        duration: "5h 35m",
        rating: 4.7,
    },
    SeedEntry {
        id: "4",
        title: "Dune",
        author: "Frank Herbert",
        description: "A desert planet, a spice that extends life, and a battle for the universe.",
        cover_seed: "dune",
        category: "Classic Sci-Fi",
        duration: "21h 05m",
        rating: 4.6,
    },
];

/// The seed catalogue; none of these books carry narration text
pub fn seed_books() -> Vec<Book> {
    SEED.iter()
        .map(|entry| {
            let mut book = Book::new(entry.id, entry.title, entry.author, entry.category);
            book.description = entry.description.to_string();
            book.cover_url = format!("https://picsum.photos/seed/{}/400/600", entry.cover_seed);
            book.duration = entry.duration.to_string();
            book.rating = entry.rating;
            book
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxlibre_core::Validator;

    #[test]
    fn test_seed_is_valid_and_unique() {
        let books = seed_books();
        assert_eq!(books.len(), 4);

        for book in &books {
            assert!(book.is_valid(), "{} should be valid", book.title);
            assert!(!book.has_narration());
        }

        let mut ids: Vec<_> = books.iter().map(|b| b.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }
}
