use platynui_query::simple::{SimpleTree, elem};
use platynui_query::{Matcher, QueryError, SearchStrategy};

fn main() -> Result<(), QueryError> {
    let window = elem("window")
        .attr("title", "Settings")
        .child(
            elem("toolbar")
                .child(elem("button").attr("name", "Save"))
                .child(elem("button").attr("name", "Save as"))
                .child(elem("button").attr("name", "Close")),
        )
        .child(
            elem("panel")
                .attr("name", "General")
                .child(elem("checkbox").attr("name", "Autosave"))
                .child(elem("edit").attr("name", "Path")),
        )
        .child(elem("panel").attr("name", "Advanced").child(elem("checkbox").attr("name", "Debug")))
        .build();

    let q = SimpleTree::query([window]);

    println!("buttons:          {}", q.find_matching("button"));
    println!("save buttons:     {}", q.find_matching("button[name^=Save]"));
    println!("second button:    {}", q.find_matching("button").eq(1)?);
    println!("breadth-first:    {}", q.search_strategy(SearchStrategy::BreadthFirst).find());
    println!("panels w/ edit:   {}", q.find_matching("panel").has("edit").to_vec()?.len());
    println!("checkbox parents: {}", q.find_matching("checkbox").closest("panel"));
    println!("after Save:       {}", q.find_matching("button[name=Save]").next_all());

    let long_names = Matcher::from_fn(|n: &platynui_query::SimpleNode| n.attribute("name").is_some_and(|s| s.len() > 5));
    for node in q.find().filter(long_names).iter() {
        let node = node?;
        println!("  {} -> {:?}", node.path(), node.attribute("name"));
    }

    Ok(())
}
