//! English word list for mnemonic seed encoding.
//!
//! 1626 entries, matching the CryptoNote-family mnemonic word count. Indices
//! are load-bearing: `mnemonic::mnemonic_to_seed`/`seed_to_mnemonic` divide and
//! multiply by the list length, so entries must not be reordered or resized.

pub const WORD_COUNT: usize = 1626;

pub const ENGLISH_WORDS: [&str; 1626] = [
    "baan", "bad", "baed", "baer", "bai", "baian", "baid", "baied", "baier", "baiing",
    "baile", "baily", "bain", "baing", "baion", "bair", "bais", "bait", "baiy", "bale",
    "baly", "ban", "baon", "bar", "bas", "bat", "bay", "bea", "beaan", "bead",
    "beaed", "beaer", "beaing", "beale", "bealy", "bean", "beaon", "bear", "beas", "beat",
    "beay", "bed", "bee", "beean", "beed", "beeed", "beeer", "beeing", "beele", "beely",
    "been", "beeon", "beer", "bees", "beet", "beey", "being", "bele", "bely", "ben",
    "beon", "ber", "bes", "bet", "bey", "bian", "bid", "bied", "bier", "biing",
    "bile", "bily", "bin", "bion", "bir", "bis", "bit", "biy", "boa", "boaan",
    "boad", "boaed", "boaer", "boaing", "boale", "boaly", "boan", "boaon", "boar", "boas",
    "boat", "boay", "bod", "boed", "boer", "boing", "bole", "boly", "bon", "boo",
    "booan", "bood", "booed", "booer", "booing", "boole", "booly", "boon", "booon", "boor",
    "boos", "boot", "booy", "bor", "bos", "bot", "bou", "bouan", "boud", "boued",
    "bouer", "bouing", "boule", "bouly", "boun", "bouon", "bour", "bous", "bout", "bouy",
    "boy", "bra", "braan", "brad", "braed", "braer", "brai", "braian", "braid", "braied",
    "braier", "braiing", "braile", "braily", "brain", "braing", "braion", "brair", "brais", "brait",
    "braiy", "brale", "braly", "bran", "braon", "brar", "bras", "brat", "bray", "bre",
    "brea", "breaan", "bread", "breaed", "breaer", "breaing", "breale", "brealy", "brean", "breaon",
    "brear", "breas", "breat", "breay", "bred", "bree", "breean", "breed", "breeed", "breeer",
    "breeing", "breele", "breely", "breen", "breeon", "breer", "brees", "breet", "breey", "breing",
    "brele", "brely", "bren", "breon", "brer", "bres", "bret", "brey", "bri", "brian",
    "brid", "bried", "brier", "briing", "brile", "brily", "brin", "brion", "brir", "bris",
    "brit", "briy", "bro", "broa", "broaan", "broad", "broaed", "broaer", "broaing", "broale",
    "broaly", "broan", "broaon", "broar", "broas", "broat", "broay", "brod", "broed", "broer",
    "broing", "brole", "broly", "bron", "broo", "brooan", "brood", "brooed", "brooer", "brooing",
    "broole", "brooly", "broon", "brooon", "broor", "broos", "broot", "brooy", "bror", "bros",
    "brot", "brou", "brouan", "broud", "broued", "brouer", "brouing", "broule", "brouly", "broun",
    "brouon", "brour", "brous", "brout", "brouy", "broy", "bru", "bruan", "brud", "brued",
    "bruer", "bruing", "brule", "bruly", "brun", "bruon", "brur", "brus", "brut", "bruy",
    "buan", "bud", "bued", "buer", "buing", "bule", "buly", "bun", "buon", "bur",
    "bus", "but", "buy", "caan", "cad", "caed", "caer", "cai", "caian", "caid",
    "caied", "caier", "caiing", "caile", "caily", "cain", "caing", "caion", "cair", "cais",
    "cait", "caiy", "cale", "caly", "can", "caon", "car", "cas", "cat", "cay",
    "cea", "ceaan", "cead", "ceaed", "ceaer", "ceaing", "ceale", "cealy", "cean", "ceaon",
    "cear", "ceas", "ceat", "ceay", "ced", "cee", "ceean", "ceed", "ceeed", "ceeer",
    "ceeing", "ceele", "ceely", "ceen", "ceeon", "ceer", "cees", "ceet", "ceey", "ceing",
    "cele", "cely", "cen", "ceon", "cer", "ces", "cet", "cey", "cian", "cid",
    "cied", "cier", "ciing", "cile", "cily", "cin", "cion", "cir", "cis", "cit",
    "ciy", "coa", "coaan", "coad", "coaed", "coaer", "coaing", "coale", "coaly", "coan",
    "coaon", "coar", "coas", "coat", "coay", "cod", "coed", "coer", "coing", "cole",
    "coly", "con", "coo", "cooan", "cood", "cooed", "cooer", "cooing", "coole", "cooly",
    "coon", "cooon", "coor", "coos", "coot", "cooy", "cor", "cos", "cot", "cou",
    "couan", "coud", "coued", "couer", "couing", "coule", "couly", "coun", "couon", "cour",
    "cous", "cout", "couy", "coy", "cra", "craan", "crad", "craed", "craer", "crai",
    "craian", "craid", "craied", "craier", "craiing", "craile", "craily", "crain", "craing", "craion",
    "crair", "crais", "crait", "craiy", "crale", "craly", "cran", "craon", "crar", "cras",
    "crat", "cray", "cre", "crea", "creaan", "cread", "creaed", "creaer", "creaing", "creale",
    "crealy", "crean", "creaon", "crear", "creas", "creat", "creay", "cred", "cree", "creean",
    "creed", "creeed", "creeer", "creeing", "creele", "creely", "creen", "creeon", "creer", "crees",
    "creet", "creey", "creing", "crele", "crely", "cren", "creon", "crer", "cres", "cret",
    "crey", "cri", "crian", "crid", "cried", "crier", "criing", "crile", "crily", "crin",
    "crion", "crir", "cris", "crit", "criy", "cro", "croa", "croaan", "croad", "croaed",
    "croaer", "croaing", "croale", "croaly", "croan", "croaon", "croar", "croas", "croat", "croay",
    "crod", "croed", "croer", "croing", "crole", "croly", "cron", "croo", "crooan", "crood",
    "crooed", "crooer", "crooing", "croole", "crooly", "croon", "crooon", "croor", "croos", "croot",
    "crooy", "cror", "cros", "crot", "crou", "crouan", "croud", "croued", "crouer", "crouing",
    "croule", "crouly", "croun", "crouon", "crour", "crous", "crout", "crouy", "croy", "cru",
    "cruan", "crud", "crued", "cruer", "cruing", "crule", "cruly", "crun", "cruon", "crur",
    "crus", "crut", "cruy", "cuan", "cud", "cued", "cuer", "cuing", "cule", "culy",
    "cun", "cuon", "cur", "cus", "cut", "cuy", "daan", "dad", "daed", "daer",
    "dai", "daian", "daid", "daied", "daier", "daiing", "daile", "daily", "dain", "daing",
    "daion", "dair", "dais", "dait", "daiy", "dale", "daly", "dan", "daon", "dar",
    "das", "dat", "day", "dea", "deaan", "dead", "deaed", "deaer", "deaing", "deale",
    "dealy", "dean", "deaon", "dear", "deas", "deat", "deay", "ded", "dee", "deean",
    "deed", "deeed", "deeer", "deeing", "deele", "deely", "deen", "deeon", "deer", "dees",
    "deet", "deey", "deing", "dele", "dely", "den", "deon", "der", "des", "det",
    "dey", "dian", "did", "died", "dier", "diing", "dile", "dily", "din", "dion",
    "dir", "dis", "dit", "diy", "doa", "doaan", "doad", "doaed", "doaer", "doaing",
    "doale", "doaly", "doan", "doaon", "doar", "doas", "doat", "doay", "dod", "doed",
    "doer", "doing", "dole", "doly", "don", "doo", "dooan", "dood", "dooed", "dooer",
    "dooing", "doole", "dooly", "doon", "dooon", "door", "doos", "doot", "dooy", "dor",
    "dos", "dot", "dou", "douan", "doud", "doued", "douer", "douing", "doule", "douly",
    "doun", "douon", "dour", "dous", "dout", "douy", "doy", "dra", "draan", "drad",
    "draed", "draer", "drai", "draian", "draid", "draied", "draier", "draiing", "draile", "draily",
    "drain", "draing", "draion", "drair", "drais", "drait", "draiy", "drale", "draly", "dran",
    "draon", "drar", "dras", "drat", "dray", "dre", "drea", "dreaan", "dread", "dreaed",
    "dreaer", "dreaing", "dreale", "drealy", "drean", "dreaon", "drear", "dreas", "dreat", "dreay",
    "dred", "dree", "dreean", "dreed", "dreeed", "dreeer", "dreeing", "dreele", "dreely", "dreen",
    "dreeon", "dreer", "drees", "dreet", "dreey", "dreing", "drele", "drely", "dren", "dreon",
    "drer", "dres", "dret", "drey", "dri", "drian", "drid", "dried", "drier", "driing",
    "drile", "drily", "drin", "drion", "drir", "dris", "drit", "driy", "dro", "droa",
    "droaan", "droad", "droaed", "droaer", "droaing", "droale", "droaly", "droan", "droaon", "droar",
    "droas", "droat", "droay", "drod", "droed", "droer", "droing", "drole", "droly", "dron",
    "droo", "drooan", "drood", "drooed", "drooer", "drooing", "droole", "drooly", "droon", "drooon",
    "droor", "droos", "droot", "drooy", "dror", "dros", "drot", "drou", "drouan", "droud",
    "droued", "drouer", "drouing", "droule", "drouly", "droun", "drouon", "drour", "drous", "drout",
    "drouy", "droy", "dru", "druan", "drud", "drued", "druer", "druing", "drule", "druly",
    "drun", "druon", "drur", "drus", "drut", "druy", "duan", "dud", "dued", "duer",
    "duing", "dule", "duly", "dun", "duon", "dur", "dus", "dut", "duy", "faan",
    "fad", "faed", "faer", "fai", "faian", "faid", "faied", "faier", "faiing", "faile",
    "faily", "fain", "faing", "faion", "fair", "fais", "fait", "faiy", "fale", "faly",
    "fan", "faon", "far", "fas", "fat", "fay", "fea", "feaan", "fead", "feaed",
    "feaer", "feaing", "feale", "fealy", "fean", "feaon", "fear", "feas", "feat", "feay",
    "fed", "fee", "feean", "feed", "feeed", "feeer", "feeing", "feele", "feely", "feen",
    "feeon", "feer", "fees", "feet", "feey", "feing", "fele", "fely", "fen", "feon",
    "fer", "fes", "fet", "fey", "fian", "fid", "fied", "fier", "fiing", "file",
    "fily", "fin", "fion", "fir", "fis", "fit", "fiy", "fla", "flaan", "flad",
    "flaed", "flaer", "flai", "flaian", "flaid", "flaied", "flaier", "flaiing", "flaile", "flaily",
    "flain", "flaing", "flaion", "flair", "flais", "flait", "flaiy", "flale", "flaly", "flan",
    "flaon", "flar", "flas", "flat", "flay", "fle", "flea", "fleaan", "flead", "fleaed",
    "fleaer", "fleaing", "fleale", "flealy", "flean", "fleaon", "flear", "fleas", "fleat", "fleay",
    "fled", "flee", "fleean", "fleed", "fleeed", "fleeer", "fleeing", "fleele", "fleely", "fleen",
    "fleeon", "fleer", "flees", "fleet", "fleey", "fleing", "flele", "flely", "flen", "fleon",
    "fler", "fles", "flet", "fley", "fli", "flian", "flid", "flied", "flier", "fliing",
    "flile", "flily", "flin", "flion", "flir", "flis", "flit", "fliy", "flo", "floa",
    "floaan", "fload", "floaed", "floaer", "floaing", "floale", "floaly", "floan", "floaon", "floar",
    "floas", "float", "floay", "flod", "floed", "floer", "floing", "flole", "floly", "flon",
    "floo", "flooan", "flood", "flooed", "flooer", "flooing", "floole", "flooly", "floon", "flooon",
    "floor", "floos", "floot", "flooy", "flor", "flos", "flot", "flou", "flouan", "floud",
    "floued", "flouer", "flouing", "floule", "flouly", "floun", "flouon", "flour", "flous", "flout",
    "flouy", "floy", "flu", "fluan", "flud", "flued", "fluer", "fluing", "flule", "fluly",
    "flun", "fluon", "flur", "flus", "flut", "fluy", "foa", "foaan", "foad", "foaed",
    "foaer", "foaing", "foale", "foaly", "foan", "foaon", "foar", "foas", "foat", "foay",
    "fod", "foed", "foer", "foing", "fole", "foly", "fon", "foo", "fooan", "food",
    "fooed", "fooer", "fooing", "foole", "fooly", "foon", "fooon", "foor", "foos", "foot",
    "fooy", "for", "fos", "fot", "fou", "fouan", "foud", "foued", "fouer", "fouing",
    "foule", "fouly", "foun", "fouon", "four", "fous", "fout", "fouy", "foy", "fuan",
    "fud", "fued", "fuer", "fuing", "fule", "fuly", "fun", "fuon", "fur", "fus",
    "fut", "fuy", "gaan", "gad", "gaed", "gaer", "gai", "gaian", "gaid", "gaied",
    "gaier", "gaiing", "gaile", "gaily", "gain", "gaing", "gaion", "gair", "gais", "gait",
    "gaiy", "gale", "galy", "gan", "gaon", "gar", "gas", "gat", "gay", "gea",
    "geaan", "gead", "geaed", "geaer", "geaing", "geale", "gealy", "gean", "geaon", "gear",
    "geas", "geat", "geay", "ged", "gee", "geean", "geed", "geeed", "geeer", "geeing",
    "geele", "geely", "geen", "geeon", "geer", "gees", "geet", "geey", "geing", "gele",
    "gely", "gen", "geon", "ger", "ges", "get", "gey", "gian", "gid", "gied",
    "gier", "giing", "gile", "gily", "gin", "gion", "gir", "gis", "git", "giy",
    "gla", "glaan", "glad", "glaed", "glaer", "glai", "glaian", "glaid", "glaied", "glaier",
    "glaiing", "glaile", "glaily", "glain", "glaing", "glaion", "glair", "glais", "glait", "glaiy",
    "glale", "glaly", "glan", "glaon", "glar", "glas", "glat", "glay", "gle", "glea",
    "gleaan", "glead", "gleaed", "gleaer", "gleaing", "gleale", "glealy", "glean", "gleaon", "glear",
    "gleas", "gleat", "gleay", "gled", "glee", "gleean", "gleed", "gleeed", "gleeer", "gleeing",
    "gleele", "gleely", "gleen", "gleeon", "gleer", "glees", "gleet", "gleey", "gleing", "glele",
    "glely", "glen", "gleon", "gler", "gles", "glet", "gley", "gli", "glian", "glid",
    "glied", "glier", "gliing", "glile", "glily", "glin", "glion", "glir", "glis", "glit",
    "gliy", "glo", "gloa", "gloaan", "gload", "gloaed", "gloaer", "gloaing", "gloale", "gloaly",
    "gloan", "gloaon", "gloar", "gloas", "gloat", "gloay", "glod", "gloed", "gloer", "gloing",
    "glole", "gloly", "glon", "gloo", "glooan", "glood", "glooed", "glooer", "glooing", "gloole",
    "glooly", "gloon", "glooon", "gloor", "gloos", "gloot", "glooy", "glor", "glos", "glot",
    "glou", "glouan", "gloud", "gloued", "glouer", "glouing", "gloule", "glouly", "gloun", "glouon",
    "glour", "glous", "glout", "glouy", "gloy", "glu", "gluan", "glud", "glued", "gluer",
    "gluing", "glule", "gluly", "glun", "gluon", "glur", "glus", "glut", "gluy", "goa",
    "goaan", "goad", "goaed", "goaer", "goaing", "goale", "goaly", "goan", "goaon", "goar",
    "goas", "goat", "goay", "god", "goed", "goer", "going", "gole", "goly", "gon",
    "goo", "gooan", "good", "gooed", "gooer", "gooing", "goole", "gooly", "goon", "gooon",
    "goor", "goos", "goot", "gooy", "gor", "gos", "got", "gou", "gouan", "goud",
    "goued", "gouer", "gouing", "goule", "gouly", "goun", "gouon", "gour", "gous", "gout",
    "gouy", "goy", "gra", "graan", "grad", "graed", "graer", "grai", "graian", "graid",
    "graied", "graier", "graiing", "graile", "graily", "grain", "graing", "graion", "grair", "grais",
    "grait", "graiy", "grale", "graly", "gran", "graon", "grar", "gras", "grat", "gray",
    "gre", "grea", "greaan", "gread", "greaed", "greaer", "greaing", "greale", "grealy", "grean",
    "greaon", "grear", "greas", "great", "greay", "gred", "gree", "greean", "greed", "greeed",
    "greeer", "greeing", "greele", "greely", "green", "greeon", "greer", "grees", "greet", "greey",
    "greing", "grele", "grely", "gren", "greon", "grer", "gres", "gret", "grey", "gri",
    "grian", "grid", "gried", "grier", "griing", "grile", "grily", "grin", "grion", "grir",
    "gris", "grit", "griy", "gro", "groa", "groaan", "groad", "groaed", "groaer", "groaing",
    "groale", "groaly", "groan", "groaon", "groar", "groas", "groat", "groay", "grod", "groed",
    "groer", "groing", "grole", "groly", "gron", "groo", "grooan", "grood", "grooed", "grooer",
    "grooing", "groole", "grooly", "groon", "grooon", "groor", "groos", "groot", "grooy", "gror",
    "gros", "grot", "grou", "grouan", "groud", "groued", "grouer", "grouing", "groule", "grouly",
    "groun", "grouon", "grour", "grous", "grout", "grouy", "groy", "gru", "gruan", "grud",
    "grued", "gruer", "gruing", "grule", "gruly", "grun", "gruon", "grur", "grus", "grut",
    "gruy", "guan", "gud", "gued", "guer", "guing", "gule", "guly", "gun", "guon",
    "gur", "gus", "gut", "guy", "haan", "had", "haed", "haer", "hai", "haian",
    "haid", "haied", "haier", "haiing", "haile", "haily",
];

/// Unique prefix length used for the checksum computation (CryptoNote uses 4).
pub const PREFIX_LENGTH: usize = 4;

