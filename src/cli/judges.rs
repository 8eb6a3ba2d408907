// src/cli/judges.rs — Judge listing

use crate::store::Store;

pub fn list_judges(store: &Store) -> anyhow::Result<()> {
    let judges = store.list_judges()?;
    if judges.is_empty() {
        println!("no judges defined");
        return Ok(());
    }

    for judge in judges {
        let flag = if judge.active { "active" } else { "inactive" };
        println!("{}  {:<24} {:<10} {}", judge.id, judge.name, flag, judge.model_id);
    }
    Ok(())
}
