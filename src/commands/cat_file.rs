use super::current_repo;
use anyhow::Result;

/// Plumbing inspector: print a stored object's type, size, or content.
pub fn cat_file_command(hash: &str, show_type: bool, show_size: bool, pretty_print: bool) -> Result<()> {
    let repo = current_repo()?;
    let (obj_type, payload) = caf::objects::read_object(&repo.objects_dir(), hash)?;

    match (show_type, show_size, pretty_print) {
        (true, false, false) => println!("{}", obj_type),
        (false, true, false) => println!("{}", payload.len()),
        _ => print!("{}", String::from_utf8_lossy(&payload)),
    }

    Ok(())
}
