/// Minimal chatbot session over a throwaway index.
///
/// Seeds a few question/answer entries, then answers canned inputs the
/// same way an interactive driver would.
use fuzzygram::{ChatBot, DocId};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut bot = ChatBot::open("demo", dir.path().join("demo.idx"), true)?;

    bot.add_entry(b"Hello! Nice to meet you.", Some(b"hello hi greetings".as_slice()))?;
    bot.add_entry(b"I'm a retrieval bot over a bigram index.", Some(b"who what are you".as_slice()))?;
    bot.add_entry(b"Tea, always tea.", Some(b"tea coffee drink".as_slice()))?;
    bot.set_random_outputs(vec![b"Hmm, tell me more.".to_vec()]);

    let mut avoid: Vec<DocId> = Vec::new();
    for line in [b"hello there" as &[u8], b"what are you?", b"coffee or tea?", b"xyzzy"] {
        let answer = bot.input(line, &avoid).unwrap_or_default();
        println!("> {}", String::from_utf8_lossy(line));
        println!("< {}", String::from_utf8_lossy(&answer));
        if let Some(id) = bot.engine().find_key(&answer) {
            avoid.push(id); // don't repeat ourselves
        }
    }

    Ok(())
}
