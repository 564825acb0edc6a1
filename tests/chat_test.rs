use fuzzygram::{ChatBot, ErrorKind};

fn writable_bot(dir: &tempfile::TempDir) -> ChatBot {
    ChatBot::open("amber", dir.path().join("bot.idx"), true).unwrap()
}

#[test]
fn open_without_write_requires_an_existing_index() {
    let dir = tempfile::tempdir().unwrap();
    let err = ChatBot::open("amber", dir.path().join("bot.idx"), false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // Once a writable bot created the index, a reader can attach.
    let mut bot = writable_bot(&dir);
    bot.add_entry(b"hello to you", None).unwrap();
    bot.engine_mut().sync().unwrap();
    drop(bot);
    assert!(ChatBot::open("reader", dir.path().join("bot.idx"), false).is_ok());
}

#[test]
fn answers_the_best_matching_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = writable_bot(&dir);

    bot.add_entry(b"I like tea.", Some(b"tea drink leaves".as_slice())).unwrap();
    bot.add_entry(b"Coffee it is.", Some(b"coffee drink beans".as_slice())).unwrap();

    let answer = bot.input(b"coffee beans", &[]).unwrap();
    assert_eq!(answer, b"Coffee it is.");
}

#[test]
fn trigger_defaults_to_the_content() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = writable_bot(&dir);

    bot.add_entry(b"good morning sunshine", None).unwrap();
    let answer = bot.input(b"morning", &[]).unwrap();
    assert_eq!(answer, b"good morning sunshine");
}

#[test]
fn avoided_and_deleted_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = writable_bot(&dir);

    let first = bot.add_entry(b"first answer", Some(b"greetings friend".as_slice())).unwrap();
    bot.add_entry(b"second answer", Some(b"greetings friend".as_slice())).unwrap();

    let answer = bot.input(b"greetings", &[first]).unwrap();
    assert_eq!(answer, b"second answer");

    bot.engine_mut().delete(b"second answer").unwrap();
    assert_eq!(bot.input(b"greetings", &[]).unwrap(), b"first answer");
    assert_eq!(bot.input(b"greetings", &[first]), None);
}

#[test]
fn synonyms_rewrite_before_querying() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = writable_bot(&dir);

    bot.add_entry(b"Hello there!", Some(b"hello greeting".as_slice())).unwrap();
    bot.add_synonym("(?i)howdy", b"hello").unwrap();

    assert_eq!(bot.input(b"HOWDY", &[]).unwrap(), b"Hello there!");
    assert!(bot.add_synonym("(unclosed", b"x").is_err());
}

#[test]
fn empty_results_fall_back_to_random_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = writable_bot(&dir);

    bot.add_entry(b"something", Some(b"specific trigger".as_slice())).unwrap();
    assert_eq!(bot.input(b"unrelated", &[]), None);

    bot.set_random_outputs(vec![b"fallback line".to_vec()]);
    assert_eq!(bot.input(b"unrelated", &[]).unwrap(), b"fallback line");
}

#[test]
fn nextone_shifts_to_the_following_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = writable_bot(&dir);

    bot.add_entry(b"entry one", Some(b"match this trigger".as_slice())).unwrap();
    bot.add_entry(b"entry two", Some(b"something else".as_slice())).unwrap();

    bot.set_nextone(true);
    // Entry 1 matches; nextone remaps 1 -> (1 % 2) + 1 = 2.
    assert_eq!(bot.input(b"match this", &[]).unwrap(), b"entry two");
}

#[test]
fn big5_queries_answer_big5_triggers() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = writable_bot(&dir);

    bot.add_entry(b"response", Some([0xA4, 0xA4, 0xA4, 0xE5].as_slice())).unwrap();
    let answer = bot.input(&[0xA4, 0xA4, 0xA4, 0xE5], &[]).unwrap();
    assert_eq!(answer, b"response");
}
