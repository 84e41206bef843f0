use std::env;

fn parse_gids(gids: &str) -> Vec<u16> {
    if gids == "*" {
        return (0..u16::MAX).collect();
    }

    let split = gids.split(',').filter(|s| !s.is_empty()).collect::<Vec<_>>();
    let mut gids = vec![];

    for el in &split {
        if el.contains('-') {
            let range = el.split('-').collect::<Vec<_>>();
            let first = range[0].parse::<u16>().unwrap();
            let second = range[1].parse::<u16>().unwrap();

            gids.extend(first..=second);
        } else {
            gids.push(el.parse::<u16>().unwrap());
        }
    }

    gids
}

// Note that this is more of an experimental CLI used for testing.
//
// Usage: cli <font.cff> [font name] [gids] [output]
// Set `RUST_LOG=debug` to see what is kept.
fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data = std::fs::read(&args[1]).unwrap();
    let set = cff_subsetter::open(&data).unwrap();

    let name = match args.get(2) {
        Some(name) => name.clone(),
        None => set.font_names().next().expect("font set is empty").to_owned(),
    };

    log::info!("subsetting {name} (cid: {:?})", set.is_cid(&name));

    let gids = parse_gids(args.get(3).map(String::as_str).unwrap_or("0-5"));
    let sub = set.subset(&name, &gids).unwrap();

    std::fs::write(args.get(4).map(String::as_str).unwrap_or("res.cff"), sub).unwrap();
}
