use trellis::{PageData, Value, context};

pub static DATA: PageData = PageData::new(content, &[]);

fn content() -> Value {
    context! {
        title => "About",
        team => ["Ada", "Grace", "Linus"],
    }
}
