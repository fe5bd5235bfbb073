//! Shared fixtures for the docweave integration tests

/// Sample template bodies as a document pipeline hands them over
pub mod fixtures {
    /// Table row hoisted under a loop over developers
    pub const DEVELOPERS_TABLE: &str = "\
Project: $project.Name
#foreach($item_developers in $developers)
| $item_developers.Name | $item_developers.LastName | ${item_developers.Mail} |
#end
";

    /// Projects nesting their own roles, with a conditional inside
    pub const NESTED_PROJECTS: &str = "\
#foreach($p in $projects)
  $p.Name
  #foreach($r in $p.roles)
    #if( $r.visible)$r.Label#end
  #end
#end
";

    /// Text opening a loop whose closer lives in a later fragment
    pub const SPLIT_OPEN: &str = "<row>#foreach($d in $developers)<cell>$d.Name</cell>";

    /// Fragment closing the loop opened by [`SPLIT_OPEN`]
    pub const SPLIT_CLOSE: &str = "</row>#end<footer/>";
}
